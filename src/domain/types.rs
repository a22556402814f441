use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The fixed set of booking type codes used by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingType {
    Once,
    Season,
    Group,
    Tourney,
    SeasonOnce,
    Promotion,
    Trainer,
    Deposit,
    Closed,
    Club,
    ClubOnce,
    SeasonTrainer,
}

impl BookingType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Once),
            2 => Some(Self::Season),
            3 => Some(Self::Group),
            4 => Some(Self::Tourney),
            5 => Some(Self::SeasonOnce),
            6 => Some(Self::Promotion),
            7 => Some(Self::Trainer),
            8 => Some(Self::Deposit),
            9 => Some(Self::Closed),
            10 => Some(Self::Club),
            11 => Some(Self::ClubOnce),
            12 => Some(Self::SeasonTrainer),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Once => 1,
            Self::Season => 2,
            Self::Group => 3,
            Self::Tourney => 4,
            Self::SeasonOnce => 5,
            Self::Promotion => 6,
            Self::Trainer => 7,
            Self::Deposit => 8,
            Self::Closed => 9,
            Self::Club => 10,
            Self::ClubOnce => 11,
            Self::SeasonTrainer => 12,
        }
    }

    /// Key used for this type in the settings color table.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Season => "season",
            Self::Group => "group",
            Self::Tourney => "tourney",
            Self::SeasonOnce => "season-once",
            Self::Promotion => "stock",
            Self::Trainer => "trainer",
            Self::Deposit => "deposit",
            Self::Closed => "closed",
            Self::Club => "club",
            Self::ClubOnce => "club-once",
            Self::SeasonTrainer => "season-train",
        }
    }

    /// Seasonal types repeat across dates and therefore require a remote
    /// availability check before any move or growth.
    pub fn is_seasonal(&self) -> bool {
        matches!(
            self,
            Self::Season | Self::Group | Self::SeasonOnce | Self::SeasonTrainer
        )
    }
}

/// Seasonal check for a raw viewing-type code (0 means "no mode selected").
pub fn is_seasonal_code(code: u8) -> bool {
    BookingType::from_code(code).is_some_and(|t| t.is_seasonal())
}

impl Serialize for BookingType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for BookingType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown booking type code {code}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 1..=12 {
            let booking_type = BookingType::from_code(code).unwrap();
            assert_eq!(booking_type.code(), code);
        }
        assert!(BookingType::from_code(0).is_none());
        assert!(BookingType::from_code(13).is_none());
    }

    #[test]
    fn seasonal_set_matches_backend() {
        let seasonal: Vec<u8> = (1..=12).filter(|c| is_seasonal_code(*c)).collect();
        assert_eq!(seasonal, vec![2, 3, 5, 12]);
        assert!(!is_seasonal_code(0));
    }
}
