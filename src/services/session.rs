use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use log::info;

use crate::api::client::{
    BookingClient, SeasonPriceEntry, SeasonPriceOrder, SeasonPriceRequest, ValidateRequest,
};
use crate::api::instructions;
use crate::config::policy::season_discount;
use crate::config::settings::AppConfig;
use crate::domain::snapshot::{normalize, RawDay, Snapshot};
use crate::domain::time::Clock;
use crate::domain::types::BookingType;
use crate::gesture::{
    self, AbortReason, Edge, GestureEffect, GestureOutcome, GesturePlan,
};
use crate::grid::builder::ViewContext;
use crate::grid::model::GridModel;
use crate::grid::build_grid;
use crate::pricing::{self, PriceContext};
use crate::selection::{self, SelectionSet};

/// One normalized snapshot with the grid built from it.
pub struct DayView {
    pub snapshot: Snapshot,
    pub grid: GridModel,
}

/// Courts with a gesture in flight. A superseding drag on a locked court
/// is rejected instead of queued; there is no cancellation of the call
/// already on the wire.
#[derive(Debug, Default)]
struct CourtLocks {
    busy: HashSet<i64>,
}

impl CourtLocks {
    fn try_acquire(&mut self, courts: &[i64]) -> bool {
        if courts.iter().any(|court| self.busy.contains(court)) {
            return false;
        }
        self.busy.extend(courts.iter().copied());
        true
    }

    fn release(&mut self, courts: &[i64]) {
        for court in courts {
            self.busy.remove(court);
        }
    }
}

/// Client-side day state: the raw server copy, the pending selections and
/// everything needed to rebuild the grid and run gestures against the
/// backend.
pub struct BookingSession {
    config: AppConfig,
    client: BookingClient,
    host: String,
    day: RawDay,
    selections: SelectionSet,
    date: NaiveDate,
    viewing_type: u8,
    admin: bool,
    season_booking: bool,
    discount: f64,
    /// Offset added to deadline checks (server/client clock skew).
    grace: Duration,
    trainer_color: Option<String>,
    promotion_color: Option<String>,
    manual_total: Option<i64>,
    locks: CourtLocks,
}

impl BookingSession {
    pub fn new(
        config: AppConfig,
        base_url: &str,
        date: NaiveDate,
        viewing_type: u8,
    ) -> Result<Self> {
        let client = BookingClient::new(base_url, &config.client)?;

        Ok(Self {
            config,
            client,
            host: base_url.to_string(),
            day: RawDay::default(),
            selections: SelectionSet::default(),
            date,
            viewing_type,
            admin: false,
            season_booking: false,
            discount: 1.0,
            grace: Duration::zero(),
            trainer_color: None,
            promotion_color: None,
            manual_total: None,
            locks: CourtLocks::default(),
        })
    }

    // --- State Access ---

    pub fn selections(&self) -> &SelectionSet {
        &self.selections
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn view_context(&self) -> ViewContext {
        ViewContext {
            admin: self.admin,
            viewing_type: self.viewing_type,
            season_booking: self.season_booking,
        }
    }

    pub fn set_trainer_color(&mut self, color: Option<String>) {
        self.trainer_color = color;
    }

    pub fn set_promotion_color(&mut self, color: Option<String>) {
        self.promotion_color = color;
    }

    pub fn set_manual_total(&mut self, total: Option<i64>) {
        self.manual_total = total;
    }

    pub fn set_grace(&mut self, grace: Duration) {
        self.grace = grace;
    }

    /// Drop every pending pick.
    pub fn clear_selections(&mut self) {
        self.selections.unselect_all();
    }

    /// Jump to another day. Pending picks never survive a date change.
    pub fn set_date(&mut self, date: NaiveDate) {
        self.selections.unselect_all();
        self.date = date;
    }

    /// Switch the viewing booking type; clears picks and re-resolves the
    /// discount from the settings table.
    pub fn set_viewing_type(&mut self, viewing_type: u8) {
        self.selections.unselect_all();
        self.viewing_type = viewing_type;
        self.discount = self.discount_for(viewing_type);
    }

    fn discount_for(&self, viewing_type: u8) -> f64 {
        self.day
            .settings
            .discount
            .get(&viewing_type.to_string())
            .copied()
            .unwrap_or(1.0)
    }

    // --- Loading & Refresh ---

    /// Full pull of the day state; seeds selections when the payload
    /// carries any.
    pub async fn load(&mut self) -> Result<()> {
        let response = self
            .client
            .poll(self.date, self.viewing_type)
            .await
            .context("day load failed")?;

        self.day = RawDay::default();
        instructions::apply(&mut self.day, &response.instructions)?;
        self.sync_from_day(true);

        info!(
            "loaded {} with {} bookings",
            self.date,
            self.day.time_blocked.len()
        );
        Ok(())
    }

    /// Periodic diff pull. Local selections are left alone; the builder's
    /// booking-wins rule reconciles them on the next rebuild.
    pub async fn refresh(&mut self) -> Result<()> {
        let response = self.client.poll(self.date, self.viewing_type).await?;
        let needs_full = instructions::apply(&mut self.day, &response.instructions)?;
        self.sync_from_day(false);

        if needs_full {
            self.load().await?;
        }
        Ok(())
    }

    fn sync_from_day(&mut self, seed_selections: bool) {
        if let Some(date) = self.day.date {
            self.date = date;
        }
        if let Some(viewing_type) = self.day.viewing_type {
            self.viewing_type = viewing_type;
        }
        self.admin = self.day.admin == 1;
        self.season_booking = self.day.is_season_booking;
        self.discount = self.discount_for(self.viewing_type);

        if seed_selections && !self.day.time_selected.is_empty() {
            self.selections = SelectionSet::from_entries(self.day.time_selected.clone());
        }
    }

    // --- Grid ---

    /// Rebuild the grid from scratch and drop selections that a refreshed
    /// booking has shadowed.
    pub fn rebuild(&mut self) -> Result<DayView> {
        let snapshot = normalize(&self.day, self.date, &self.config.grid)?;
        let clock = Clock {
            now: Local::now().naive_local(),
            grace: self.grace,
        };
        let grid = build_grid(
            &snapshot,
            &self.selections,
            &clock,
            &self.view_context(),
            &self.config.grid,
        )?;

        for stale in &grid.stale_selections {
            self.selections.unselect(stale);
        }

        Ok(DayView { snapshot, grid })
    }

    // --- Clicks ---

    pub fn click(&mut self, grid: &GridModel, cell_index: usize) -> bool {
        let view_context = self.view_context();
        selection::click(&mut self.selections, grid, cell_index, &view_context)
    }

    pub fn sweep(&mut self, grid: &GridModel, cells: &[usize]) -> bool {
        selection::select_sweep(&mut self.selections, grid, cells)
    }

    // --- Gestures ---

    /// Drop a group onto a new first cell, validating seasonal conflicts
    /// remotely before anything changes.
    pub async fn move_group(
        &mut self,
        grid: &GridModel,
        source_group: usize,
        target_first_cell: usize,
    ) -> Result<GestureOutcome> {
        let plan = match gesture::plan_move(grid, &self.view_context(), source_group, target_first_cell)
        {
            Ok(plan) => plan,
            Err(reason) => return Ok(GestureOutcome::Aborted(reason)),
        };
        self.execute(plan).await
    }

    /// Drag one edge of a group to a new boundary cell.
    pub async fn stretch_group(
        &mut self,
        grid: &GridModel,
        source_group: usize,
        edge: Edge,
        boundary_cell: usize,
    ) -> Result<GestureOutcome> {
        let plan = match gesture::plan_stretch(
            grid,
            &self.view_context(),
            &self.config.grid,
            source_group,
            edge,
            boundary_cell,
        ) {
            Ok(plan) => plan,
            Err(reason) => return Ok(GestureOutcome::Aborted(reason)),
        };
        self.execute(plan).await
    }

    async fn execute(&mut self, plan: GesturePlan) -> Result<GestureOutcome> {
        if !self.locks.try_acquire(&plan.lock_courts) {
            return Ok(GestureOutcome::Aborted(AbortReason::CourtBusy));
        }
        let lock_courts = plan.lock_courts.clone();
        let outcome = self.run_plan(plan).await;
        self.locks.release(&lock_courts);
        outcome
    }

    async fn run_plan(&mut self, plan: GesturePlan) -> Result<GestureOutcome> {
        if let Some(probe) = &plan.validation {
            let request = ValidateRequest {
                order_id: probe.order_id,
                date_at: self.date,
                court_id: probe.court_id,
                time_from: probe.time_from,
                time_to: probe.time_to,
            };
            let response = self
                .client
                .validate(&request)
                .await
                .context("availability check failed")?;
            if !response.success {
                return Ok(GestureOutcome::Aborted(AbortReason::Conflicts(
                    response.dates,
                )));
            }
        }

        match &plan.effect {
            GestureEffect::UpdateSelection { select, unselect } => {
                for key in unselect {
                    self.selections.unselect(key);
                }
                for key in select {
                    self.selections.select(key.clone());
                }
            }
            GestureEffect::Move(command) => {
                self.client
                    .commit_move(command, self.viewing_type)
                    .await
                    .context("move commit failed")?;
                info!(
                    "moved booking {} to court {} at {}-{}",
                    command.booking_id, command.court_id, command.time_from, command.time_to
                );
            }
            GestureEffect::Stretch(command) => {
                self.client
                    .commit_stretch(command, self.viewing_type)
                    .await
                    .context("stretch commit failed")?;
                info!(
                    "stretched booking {} to {}-{}",
                    command.booking_id, command.time_from, command.time_to
                );
            }
        }

        Ok(GestureOutcome::Committed(plan.effect))
    }

    // --- Pricing ---

    /// Price the current selection locally.
    pub fn price_selected(&self, view: &DayView) -> i64 {
        let groups = view.grid.selected_groups();
        let ctx = PriceContext {
            type_code: self.viewing_type,
            discount: self.discount,
            manual_total: self.manual_total,
            promotion_color: self.promotion_color.as_deref(),
            trainer_color: self.trainer_color.as_deref(),
            host: &self.host,
            today: Local::now().date_naive(),
        };
        pricing::price_groups(&view.snapshot, &view.grid, &groups, &ctx, &self.config.venue)
    }

    /// Price via the backend for seasonal admin contexts, locally for
    /// everything else.
    pub async fn season_price(&self, view: &DayView) -> Result<f64> {
        let seasonal_context = self.viewing_type == BookingType::Season.code()
            || self.viewing_type == BookingType::SeasonTrainer.code();
        if !self.admin || !seasonal_context {
            return Ok(self.price_selected(view) as f64);
        }

        let ordertime = view
            .grid
            .selected_groups()
            .into_iter()
            .enumerate()
            .map(|(index, group_index)| {
                let group = view.grid.group(group_index);
                (
                    index.to_string(),
                    SeasonPriceEntry {
                        court_id: group.court_id,
                        time_from: group.time_from,
                        time_to: group.time_to,
                    },
                )
            })
            .collect();

        let request = SeasonPriceRequest {
            date: self.date,
            ordertime,
            order: SeasonPriceOrder {
                type_id: self.viewing_type,
                discount: season_discount(self.date),
            },
        };

        let response = self
            .client
            .season_price(&request)
            .await
            .context("season price lookup failed")?;
        Ok(response.price)
    }
}
