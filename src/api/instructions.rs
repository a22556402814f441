use std::collections::BTreeMap;

use anyhow::{Context, Result};
use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::snapshot::RawDay;

/// Verbs are applied in this order regardless of wire ordering.
const VERBS: [&str; 6] = ["add", "update", "delete", "remove", "set", "refresh"];

/// The diff protocol of the polling endpoint: verb → collection name →
/// one element or a list of elements.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Instructions(pub BTreeMap<String, BTreeMap<String, Value>>);

impl Instructions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Apply a set of instructions to the local day state. Returns whether a
/// full re-pull was requested via the `refresh` verb.
pub fn apply(day: &mut RawDay, instructions: &Instructions) -> Result<bool> {
    let mut needs_refresh = false;

    for verb in VERBS {
        let Some(collections) = instructions.0.get(verb) else {
            continue;
        };
        if verb == "refresh" {
            needs_refresh = true;
            continue;
        }
        for (name, value) in collections {
            apply_to_collection(day, verb, name, value)
                .with_context(|| format!("failed to {verb} {name}"))?;
        }
    }

    Ok(needs_refresh)
}

fn apply_to_collection(day: &mut RawDay, verb: &str, name: &str, value: &Value) -> Result<()> {
    match name {
        "time_blocked" => mutate_list(&mut day.time_blocked, verb, value),
        "time_selected" => mutate_list(&mut day.time_selected, verb, value),
        "court_types" => mutate_list(&mut day.court_types, verb, value),
        "inflates" => mutate_list(&mut day.inflates, verb, value),
        "time_list" if verb == "set" => replace(&mut day.time_list, value),
        "time_price" if verb == "set" => replace(&mut day.time_price, value),
        "settings" if verb == "set" => replace(&mut day.settings, value),
        "date" if verb == "set" => replace(&mut day.date, value),
        "admin" if verb == "set" => replace(&mut day.admin, value),
        "type" if verb == "set" => replace(&mut day.viewing_type, value),
        "is_season_booking" if verb == "set" => replace(&mut day.is_season_booking, value),
        _ => {
            warn!("ignoring instruction {verb} for unknown collection {name}");
            Ok(())
        }
    }
}

// --- List Mutation ---

fn mutate_list<T>(list: &mut Vec<T>, verb: &str, value: &Value) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    match verb {
        "add" => add_items(list, value),
        "update" => update_items(list, value),
        "delete" | "remove" => {
            remove_items(list, value);
            Ok(())
        }
        "set" => replace(list, value),
        _ => Ok(()),
    }
}

fn elements(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn add_items<T: DeserializeOwned>(list: &mut Vec<T>, value: &Value) -> Result<()> {
    for element in elements(value) {
        list.push(serde_json::from_value(element)?);
    }
    Ok(())
}

/// Replace elements in place, matched by id.
fn update_items<T>(list: &mut [T], value: &Value) -> Result<()>
where
    T: Serialize + DeserializeOwned,
{
    for element in elements(value) {
        let Some(id) = element.get("id").cloned() else {
            continue;
        };
        let position = list
            .iter()
            .position(|item| item_field(item, "id") == Some(id.clone()));
        if let Some(position) = position {
            list[position] = serde_json::from_value(element)?;
        }
    }
    Ok(())
}

/// Splice out the first element whose serialized fields all equal the
/// fields listed in the patch.
fn remove_items<T: Serialize>(list: &mut Vec<T>, value: &Value) {
    for element in elements(value) {
        let Some(fields) = element.as_object() else {
            continue;
        };
        if let Some(position) = list.iter().position(|item| matches_fields(item, fields)) {
            list.remove(position);
        }
    }
}

fn replace<T: DeserializeOwned>(slot: &mut T, value: &Value) -> Result<()> {
    *slot = serde_json::from_value(value.clone())?;
    Ok(())
}

fn item_field<T: Serialize>(item: &T, field: &str) -> Option<Value> {
    serde_json::to_value(item).ok()?.get(field).cloned()
}

fn matches_fields<T: Serialize>(item: &T, fields: &Map<String, Value>) -> bool {
    let Ok(Value::Object(own)) = serde_json::to_value(item) else {
        return false;
    };
    fields.iter().all(|(key, value)| own.get(key) == Some(value))
}
