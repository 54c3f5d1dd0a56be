//! Linked-selector state machine
//!
//! The interactive core: keeps the start-date, end-date, and variable
//! selectors consistent while exactly one trace stays visible. The state
//! is a single-owner mutable struct passed into each transition, never
//! ambient globals, so the machine is testable without a rendering
//! engine. The generated artifact embeds the same transition logic in
//! JavaScript; the two must stay in lockstep.
//!
//! Every transition runs to completion: clamp, recompute, two visibility
//! toggles, title, and (range mode) the axis window. Events never
//! interleave and never pre-empt each other.

use crate::consolidate::ConsolidationMode;
use crate::discovery::DatedFile;
use crate::trace::TraceLayout;
use chrono::{Duration, NaiveDateTime};

/// One control widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Range mode: start of the visible window
    StartDate,
    /// Range mode: end of the visible window (inclusive of its full day)
    EndDate,
    /// Per-date mode: the single date dimension
    Date,
    Variable,
}

/// Control widgets for a mode, in positional order. The artifact
/// dispatches clicks as (control index, choice index) against this
/// ordering.
pub fn controls(mode: ConsolidationMode) -> &'static [Control] {
    match mode {
        ConsolidationMode::PerDate => &[Control::Date, Control::Variable],
        ConsolidationMode::Range => &[Control::StartDate, Control::EndDate, Control::Variable],
    }
}

/// The composite selector state. Created at render time with every index
/// at zero; mutated only by [`SelectorState::apply_click`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorState {
    pub start_date: usize,
    pub end_date: usize,
    pub variable: usize,
    pub previous_visible_trace: usize,
}

impl Default for SelectorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a transition needs besides the state itself
pub struct SelectorContext<'a> {
    pub mode: ConsolidationMode,
    pub layout: &'a TraceLayout,
    pub dates: &'a [DatedFile],
    pub variables: &'a [String],
    /// Leading fragment of the recomputed title (chart name, folder)
    pub title_base: &'a str,
}

/// What the chart must do after a transition: exactly two visibility
/// toggles, a title update, and in range mode a new x-axis window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effects {
    pub hide: usize,
    pub show: usize,
    pub title: String,
    /// Half-open window `[start 00:00:00, (end + 1 day) 00:00:00)`
    pub x_window: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl SelectorState {
    pub fn new() -> Self {
        Self {
            start_date: 0,
            end_date: 0,
            variable: 0,
            previous_visible_trace: 0,
        }
    }

    /// Apply one control click and return the chart effects.
    ///
    /// Choice indices are clamped into range, date indices are clamped
    /// against each other (end never precedes start), and the visible
    /// trace is recomputed through the layout map.
    pub fn apply_click(&mut self, ctx: &SelectorContext, control: Control, choice: usize) -> Effects {
        match control {
            Control::StartDate => {
                self.start_date = clamp(choice, ctx.dates.len());
                if self.end_date < self.start_date {
                    self.end_date = self.start_date;
                }
            }
            Control::EndDate => {
                self.end_date = clamp(choice, ctx.dates.len());
                if self.start_date > self.end_date {
                    self.start_date = self.end_date;
                }
            }
            Control::Date => {
                self.start_date = clamp(choice, ctx.dates.len());
                self.end_date = self.start_date;
            }
            Control::Variable => {
                self.variable = clamp(choice, ctx.variables.len());
            }
        }

        let show = match ctx.mode {
            ConsolidationMode::PerDate => ctx.layout.id(self.start_date, self.variable),
            ConsolidationMode::Range => ctx.layout.id(0, self.variable),
        };
        let hide = self.previous_visible_trace;
        self.previous_visible_trace = show;

        Effects {
            hide,
            show,
            title: self.title(ctx),
            x_window: self.x_window(ctx),
        }
    }

    fn title(&self, ctx: &SelectorContext) -> String {
        let variable = ctx
            .variables
            .get(self.variable)
            .map(String::as_str)
            .unwrap_or("");
        match ctx.mode {
            ConsolidationMode::PerDate => {
                let date_key = ctx
                    .dates
                    .get(self.start_date)
                    .map(|d| d.date_key.as_str())
                    .unwrap_or("");
                format!("{} - {} / {}", ctx.title_base, date_key, variable)
            }
            ConsolidationMode::Range => {
                let start = ctx
                    .dates
                    .get(self.start_date)
                    .map(|d| d.date_key.as_str())
                    .unwrap_or("");
                let end = ctx
                    .dates
                    .get(self.end_date)
                    .map(|d| d.date_key.as_str())
                    .unwrap_or("");
                format!("{} - {} ({} to {})", ctx.title_base, variable, start, end)
            }
        }
    }

    fn x_window(&self, ctx: &SelectorContext) -> Option<(NaiveDateTime, NaiveDateTime)> {
        if ctx.mode != ConsolidationMode::Range {
            return None;
        }
        let start = ctx.dates.get(self.start_date)?.date.and_hms_opt(0, 0, 0)?;
        let end = ctx.dates.get(self.end_date)?.date.and_hms_opt(0, 0, 0)? + Duration::days(1);
        Some((start, end))
    }
}

fn clamp(choice: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        choice.min(len - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn dates(n: usize) -> Vec<DatedFile> {
        (0..n)
            .map(|i| {
                let date = NaiveDate::from_ymd_opt(2025, 1, 1 + i as u32).unwrap();
                DatedFile {
                    path: format!("x_2025010{}.csv", i + 1),
                    date_key: format!("2025010{}", i + 1),
                    date,
                }
            })
            .collect()
    }

    fn variables() -> Vec<String> {
        vec!["Power".to_string(), "Temp".to_string()]
    }

    struct Fixture {
        layout: TraceLayout,
        dates: Vec<DatedFile>,
        variables: Vec<String>,
        mode: ConsolidationMode,
    }

    impl Fixture {
        fn per_date(n_dates: usize) -> Self {
            Self {
                layout: TraceLayout::per_date(n_dates, 2),
                dates: dates(n_dates),
                variables: variables(),
                mode: ConsolidationMode::PerDate,
            }
        }

        fn range(n_dates: usize) -> Self {
            Self {
                layout: TraceLayout::range(2),
                dates: dates(n_dates),
                variables: variables(),
                mode: ConsolidationMode::Range,
            }
        }

        fn ctx(&self) -> SelectorContext<'_> {
            SelectorContext {
                mode: self.mode,
                layout: &self.layout,
                dates: &self.dates,
                variables: &self.variables,
                title_base: "Data Viewer",
            }
        }
    }

    /// Track visibility the way the chart would, asserting the
    /// exactly-one-visible invariant after every transition
    struct VisibilityModel {
        visible: Vec<bool>,
    }

    impl VisibilityModel {
        fn new(trace_count: usize) -> Self {
            let mut visible = vec![false; trace_count];
            visible[0] = true;
            Self { visible }
        }

        fn apply(&mut self, effects: &Effects) {
            self.visible[effects.hide] = false;
            self.visible[effects.show] = true;
        }

        fn visible_count(&self) -> usize {
            self.visible.iter().filter(|v| **v).count()
        }
    }

    #[test]
    fn test_variable_click_toggles_traces() {
        let fx = Fixture::per_date(2);
        let mut state = SelectorState::new();
        let mut chart = VisibilityModel::new(fx.layout.trace_count());

        let effects = state.apply_click(&fx.ctx(), Control::Variable, 1);
        chart.apply(&effects);

        assert_eq!(effects.hide, 0);
        assert_eq!(effects.show, 1);
        assert_eq!(chart.visible_count(), 1);
        assert!(effects.title.contains("20250101 / Temp"));
    }

    #[test]
    fn test_date_then_variable_compose() {
        let fx = Fixture::per_date(2);
        let mut state = SelectorState::new();
        let mut chart = VisibilityModel::new(fx.layout.trace_count());

        chart.apply(&state.apply_click(&fx.ctx(), Control::Date, 1));
        let effects = state.apply_click(&fx.ctx(), Control::Variable, 1);
        chart.apply(&effects);

        // date 1, variable 1 of a 2x2 layout
        assert_eq!(effects.show, 3);
        assert_eq!(chart.visible_count(), 1);
        assert!(effects.title.contains("20250102 / Temp"));
    }

    #[test]
    fn test_end_before_start_clamps_forward() {
        let fx = Fixture::range(2);
        let mut state = SelectorState::new();

        state.apply_click(&fx.ctx(), Control::EndDate, 0);
        state.apply_click(&fx.ctx(), Control::StartDate, 1);

        // Selecting a start past the end drags the end along
        assert_eq!(state.start_date, 1);
        assert_eq!(state.end_date, 1);
    }

    #[test]
    fn test_start_after_end_clamps_backward() {
        let fx = Fixture::range(3);
        let mut state = SelectorState::new();

        state.apply_click(&fx.ctx(), Control::StartDate, 2);
        state.apply_click(&fx.ctx(), Control::EndDate, 1);

        assert_eq!(state.start_date, 1);
        assert_eq!(state.end_date, 1);
    }

    #[test]
    fn test_range_window_is_end_inclusive() {
        let fx = Fixture::range(3);
        let mut state = SelectorState::new();

        let effects = state.apply_click(&fx.ctx(), Control::EndDate, 1);

        let (lo, hi) = effects.x_window.unwrap();
        assert_eq!(
            lo,
            NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        // End date 20250102 keeps its whole day
        assert_eq!(
            hi,
            NaiveDate::from_ymd_opt(2025, 1, 3)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_per_date_mode_has_no_window() {
        let fx = Fixture::per_date(2);
        let mut state = SelectorState::new();

        let effects = state.apply_click(&fx.ctx(), Control::Date, 1);
        assert!(effects.x_window.is_none());
    }

    #[test]
    fn test_out_of_range_choice_is_clamped() {
        let fx = Fixture::per_date(2);
        let mut state = SelectorState::new();

        state.apply_click(&fx.ctx(), Control::Date, 99);
        assert_eq!(state.start_date, 1);

        state.apply_click(&fx.ctx(), Control::Variable, 99);
        assert_eq!(state.variable, 1);
    }

    #[test]
    fn test_range_variable_click_toggles_variable_trace() {
        let fx = Fixture::range(2);
        let mut state = SelectorState::new();
        let mut chart = VisibilityModel::new(fx.layout.trace_count());

        let effects = state.apply_click(&fx.ctx(), Control::Variable, 1);
        chart.apply(&effects);

        assert_eq!(effects.hide, 0);
        assert_eq!(effects.show, 1);
        assert_eq!(chart.visible_count(), 1);
        assert!(effects.title.contains("Temp"));
    }

    #[test]
    fn test_controls_per_mode() {
        assert_eq!(
            controls(ConsolidationMode::PerDate),
            &[Control::Date, Control::Variable]
        );
        assert_eq!(
            controls(ConsolidationMode::Range),
            &[Control::StartDate, Control::EndDate, Control::Variable]
        );
    }

    proptest! {
        /// Range mode: start <= end after every event, for any event
        /// sequence
        #[test]
        fn prop_start_never_exceeds_end(clicks in prop::collection::vec((0usize..3, 0usize..10), 0..50)) {
            let fx = Fixture::range(4);
            let mut state = SelectorState::new();
            let ctrls = controls(ConsolidationMode::Range);

            for (control_idx, choice) in clicks {
                state.apply_click(&fx.ctx(), ctrls[control_idx], choice);
                prop_assert!(state.start_date <= state.end_date);
                prop_assert!(state.end_date < fx.dates.len());
            }
        }

        /// Exactly one trace stays visible under any click sequence
        #[test]
        fn prop_exactly_one_visible(clicks in prop::collection::vec((0usize..2, 0usize..10), 0..50)) {
            let fx = Fixture::per_date(3);
            let mut state = SelectorState::new();
            let mut chart = VisibilityModel::new(fx.layout.trace_count());
            let ctrls = controls(ConsolidationMode::PerDate);

            for (control_idx, choice) in clicks {
                let effects = state.apply_click(&fx.ctx(), ctrls[control_idx], choice);
                chart.apply(&effects);
                prop_assert_eq!(chart.visible_count(), 1);
            }
        }
    }
}
