//! Browse-mode navigation: which card and sub-tab are active, and where the
//! horizontally scrolling strip of sub-tab chips sits.
//!
//! All geometry is in terminal columns. Edge-arrow visibility is derived from
//! the current offset on every query, so it can never disagree with it.

use crate::catalog::CategoryCard;
use crate::util::display_width;
use std::ops::Range;

/// Columns of padding around a chip label (one space each side).
const CHIP_PADDING: usize = 2;
/// Columns between adjacent chips.
const CHIP_GAP: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Left,
    Right,
}

/// A snapshot of the navigation state for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavState {
    pub active_category: String,
    pub active_subcategory: String,
    pub scroll_offset: usize,
    pub can_scroll_left: bool,
    pub can_scroll_right: bool,
}

#[derive(Debug, Clone)]
pub struct BrowseNav {
    cards: Vec<CategoryCard>,
    active_card: usize,
    active_subcategory: String,
    focused_card: usize,
    scroll_offset: usize,
    visible_width: usize,
    step: usize,
}

impl BrowseNav {
    /// Starts on the first card and its first sub-tab.
    pub fn new(cards: Vec<CategoryCard>, step: usize) -> Self {
        let active_subcategory = cards
            .first()
            .and_then(CategoryCard::first_sub_tab)
            .unwrap_or_default()
            .to_string();
        Self {
            cards,
            active_card: 0,
            active_subcategory,
            focused_card: 0,
            scroll_offset: 0,
            visible_width: 0,
            step: step.max(1),
        }
    }

    pub fn cards(&self) -> &[CategoryCard] {
        &self.cards
    }

    pub fn active_card(&self) -> Option<&CategoryCard> {
        self.cards.get(self.active_card)
    }

    pub fn active_card_index(&self) -> usize {
        self.active_card
    }

    pub fn active_category(&self) -> &str {
        self.active_card().map(|c| c.name.as_str()).unwrap_or("")
    }

    pub fn active_subcategory(&self) -> &str {
        &self.active_subcategory
    }

    pub fn focused_card(&self) -> usize {
        self.focused_card
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn visible_width(&self) -> usize {
        self.visible_width
    }

    pub fn can_scroll_left(&self) -> bool {
        self.scroll_offset > 0
    }

    /// One column of slack so a strip that ends exactly at the edge doesn't
    /// show a dangling arrow.
    pub fn can_scroll_right(&self) -> bool {
        let limit = self.scroll_width() as i64 - self.visible_width as i64 - 1;
        (self.scroll_offset as i64) < limit
    }

    pub fn state(&self) -> NavState {
        NavState {
            active_category: self.active_category().to_string(),
            active_subcategory: self.active_subcategory.clone(),
            scroll_offset: self.scroll_offset,
            can_scroll_left: self.can_scroll_left(),
            can_scroll_right: self.can_scroll_right(),
        }
    }

    // ========================================================================
    // Strip geometry
    // ========================================================================

    /// `(start column, width)` of every chip in the active card's strip.
    pub fn chip_spans(&self) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut x = 0;
        for tab in self.active_card().map(|c| c.sub_tabs.as_slice()).unwrap_or(&[]) {
            let width = display_width(tab) + CHIP_PADDING;
            spans.push((x, width));
            x += width + CHIP_GAP;
        }
        spans
    }

    /// Total width of the active card's strip.
    pub fn scroll_width(&self) -> usize {
        self.chip_spans()
            .last()
            .map(|(start, width)| start + width)
            .unwrap_or(0)
    }

    fn max_offset(&self) -> usize {
        self.scroll_width().saturating_sub(self.visible_width)
    }

    fn clamp_offset(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.max_offset());
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Activate the card named `name`.
    ///
    /// The current sub-tab is kept if the new card has one of the same name,
    /// otherwise the card's first sub-tab becomes active. Unknown names are
    /// ignored.
    pub fn select_category(&mut self, name: &str) -> bool {
        let Some(index) = self.cards.iter().position(|c| c.name == name) else {
            tracing::debug!(category = name, "Ignoring unknown category");
            return false;
        };
        self.activate_card(index);
        true
    }

    /// Activate the card at `index`, same rules as [`Self::select_category`].
    pub fn select_card(&mut self, index: usize) -> bool {
        if index >= self.cards.len() {
            return false;
        }
        self.activate_card(index);
        true
    }

    fn activate_card(&mut self, index: usize) {
        self.active_card = index;
        let card = &self.cards[index];
        if !card.has_sub_tab(&self.active_subcategory) {
            self.active_subcategory = card.first_sub_tab().unwrap_or_default().to_string();
        }
        self.scroll_offset = 0;
        self.reveal_active_subcategory();
        self.scroll_to_card(index);
    }

    /// Activate a sub-tab of the active card. Names the card doesn't have are
    /// rejected and leave the state untouched.
    pub fn select_subcategory(&mut self, name: &str) -> bool {
        let known = self.active_card().is_some_and(|c| c.has_sub_tab(name));
        if !known {
            tracing::debug!(
                category = self.active_category(),
                subcategory = name,
                "Ignoring subcategory not in active card"
            );
            return false;
        }
        self.active_subcategory = name.to_string();
        self.reveal_active_subcategory();
        true
    }

    /// Step to the next (or previous) sub-tab, wrapping around.
    pub fn cycle_subcategory(&mut self, forward: bool) -> bool {
        let Some(card) = self.active_card() else {
            return false;
        };
        let len = card.sub_tabs.len();
        if len == 0 {
            return false;
        }
        let current = card
            .sub_tabs
            .iter()
            .position(|s| *s == self.active_subcategory)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        let name = card.sub_tabs[next].clone();
        self.select_subcategory(&name)
    }

    /// The strip's viewport changed size.
    pub fn resize(&mut self, visible_width: usize) {
        self.visible_width = visible_width;
        self.clamp_offset();
    }

    /// Move the strip by one step. Returns whether the offset changed.
    pub fn scroll(&mut self, direction: ScrollDirection) -> bool {
        let before = self.scroll_offset;
        self.scroll_offset = match direction {
            ScrollDirection::Left => self.scroll_offset.saturating_sub(self.step),
            ScrollDirection::Right => (self.scroll_offset + self.step).min(self.max_offset()),
        };
        before != self.scroll_offset
    }

    /// Bring card `index` into the carousel's view. Out-of-range indices are
    /// ignored.
    pub fn scroll_to_card(&mut self, index: usize) -> bool {
        if index >= self.cards.len() {
            return false;
        }
        self.focused_card = index;
        true
    }

    /// Scroll the strip the minimum amount that shows the active chip whole.
    pub fn reveal_active_subcategory(&mut self) {
        let Some(index) = self
            .active_card()
            .and_then(|c| c.sub_tabs.iter().position(|s| *s == self.active_subcategory))
        else {
            return;
        };
        let spans = self.chip_spans();
        let (start, width) = spans[index];
        if start < self.scroll_offset {
            self.scroll_offset = start;
        } else if self.visible_width > 0 && start + width > self.scroll_offset + self.visible_width
        {
            self.scroll_offset = (start + width).saturating_sub(self.visible_width);
        }
        self.clamp_offset();
    }

    /// Indices of the cards to draw when `per_view` fit side by side, with the
    /// focused card as close to the middle as the ends allow.
    pub fn card_window(&self, per_view: usize) -> Range<usize> {
        let len = self.cards.len();
        if len == 0 {
            return 0..0;
        }
        let per_view = per_view.clamp(1, len);
        let start = self
            .focused_card
            .saturating_sub(per_view / 2)
            .min(len - per_view);
        start..start + per_view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_cards;
    use proptest::prelude::*;

    fn nav() -> BrowseNav {
        BrowseNav::new(default_cards(), 4)
    }

    #[test]
    fn test_starts_on_first_card() {
        let nav = nav();
        assert_eq!(nav.active_category(), "Colleges");
        assert_eq!(nav.active_subcategory(), "All");
        assert!(!nav.can_scroll_left());
    }

    #[test]
    fn test_unknown_subcategory_is_ignored() {
        let mut nav = nav();
        assert!(nav.select_subcategory("Fees"));
        assert!(!nav.select_subcategory("Syllabus"));
        assert_eq!(nav.active_subcategory(), "Fees");
    }

    #[test]
    fn test_switching_category_falls_back_to_first_tab() {
        let mut nav = nav();
        nav.select_subcategory("Placements");
        assert!(nav.select_category("Exams"));
        assert_eq!(nav.active_subcategory(), "All");
    }

    #[test]
    fn test_switching_category_keeps_shared_tab() {
        let mut cards = default_cards();
        cards[1].sub_tabs.push("Fees".to_string());
        let mut nav = BrowseNav::new(cards, 4);
        nav.select_subcategory("Fees");
        nav.select_category("Exams");
        assert_eq!(nav.active_subcategory(), "Fees");
    }

    #[test]
    fn test_unknown_category_is_ignored() {
        let mut nav = nav();
        assert!(!nav.select_category("News"));
        assert_eq!(nav.active_category(), "Colleges");
    }

    #[test]
    fn test_edge_arrows_follow_offset() {
        let mut nav = nav();
        // Colleges strip: All(5) Admissions(12) Fees(6) Facility(10) Placements(12)
        // plus 4 gaps = 49 columns.
        assert_eq!(nav.scroll_width(), 49);

        nav.resize(20);
        assert!(!nav.can_scroll_left());
        assert!(nav.can_scroll_right());

        while nav.scroll(ScrollDirection::Right) {}
        assert_eq!(nav.scroll_offset(), 29);
        assert!(nav.can_scroll_left());
        assert!(!nav.can_scroll_right());

        nav.scroll(ScrollDirection::Left);
        assert_eq!(nav.scroll_offset(), 25);
    }

    #[test]
    fn test_state_snapshot_tracks_selection_and_scroll() {
        let mut nav = nav();
        nav.resize(20);
        nav.select_subcategory("Fees");
        nav.scroll(ScrollDirection::Right);

        let state = nav.state();
        assert_eq!(
            state,
            NavState {
                active_category: "Colleges".to_string(),
                active_subcategory: "Fees".to_string(),
                scroll_offset: nav.scroll_offset(),
                can_scroll_left: nav.scroll_offset() > 0,
                can_scroll_right: nav.can_scroll_right(),
            }
        );
        assert!(state.can_scroll_left);
    }

    #[test]
    fn test_one_column_tolerance_on_right_edge() {
        let mut nav = nav();
        nav.resize(48);
        // 49 - 48 - 1 = 0: at offset 0 the strip is within a column of fitting.
        assert!(!nav.can_scroll_right());
        nav.resize(47);
        assert!(nav.can_scroll_right());
    }

    #[test]
    fn test_wide_viewport_never_scrolls() {
        let mut nav = nav();
        nav.resize(200);
        assert!(!nav.scroll(ScrollDirection::Right));
        assert!(!nav.can_scroll_left());
        assert!(!nav.can_scroll_right());
    }

    #[test]
    fn test_selecting_far_tab_reveals_it() {
        let mut nav = nav();
        nav.resize(20);
        nav.select_subcategory("Placements");
        let (start, width) = *nav.chip_spans().last().unwrap();
        assert!(nav.scroll_offset() <= start);
        assert!(start + width <= nav.scroll_offset() + 20);

        nav.select_subcategory("All");
        assert_eq!(nav.scroll_offset(), 0);
    }

    #[test]
    fn test_cycle_wraps() {
        let mut nav = nav();
        nav.cycle_subcategory(false);
        assert_eq!(nav.active_subcategory(), "Placements");
        nav.cycle_subcategory(true);
        assert_eq!(nav.active_subcategory(), "All");
    }

    #[test]
    fn test_card_window_centres_focus() {
        let mut nav = nav();
        assert_eq!(nav.card_window(3), 0..3);
        nav.scroll_to_card(2);
        assert_eq!(nav.card_window(3), 1..4);
        nav.scroll_to_card(3);
        assert_eq!(nav.card_window(3), 1..4);
        assert_eq!(nav.card_window(10), 0..4);
        assert!(!nav.scroll_to_card(9));
        assert_eq!(nav.focused_card(), 3);
    }

    #[test]
    fn test_scroll_to_card_leaves_selection() {
        let mut nav = nav();
        nav.scroll_to_card(2);
        assert_eq!(nav.active_category(), "Colleges");
    }

    #[derive(Debug, Clone)]
    enum Action {
        Category(usize),
        Sub(String),
        Cycle(bool),
        Resize(usize),
        Scroll(bool),
        Card(usize),
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (0usize..6).prop_map(Action::Category),
            prop::sample::select(vec![
                "All", "Fees", "Dates", "Private", "By Rank", "Nope"
            ])
            .prop_map(|s| Action::Sub(s.to_string())),
            any::<bool>().prop_map(Action::Cycle),
            (0usize..80).prop_map(Action::Resize),
            any::<bool>().prop_map(Action::Scroll),
            (0usize..6).prop_map(Action::Card),
        ]
    }

    proptest! {
        #[test]
        fn prop_nav_invariants_hold(actions in prop::collection::vec(action(), 0..40)) {
            let mut nav = nav();
            for a in actions {
                match a {
                    Action::Category(i) => { nav.select_card(i); }
                    Action::Sub(s) => { nav.select_subcategory(&s); }
                    Action::Cycle(f) => { nav.cycle_subcategory(f); }
                    Action::Resize(w) => nav.resize(w),
                    Action::Scroll(right) => {
                        nav.scroll(if right { ScrollDirection::Right } else { ScrollDirection::Left });
                    }
                    Action::Card(i) => { nav.scroll_to_card(i); }
                }

                let state = nav.state();
                let card = nav.active_card().unwrap();
                prop_assert_eq!(state.active_category.as_str(), card.name.as_str());
                prop_assert!(card.has_sub_tab(&state.active_subcategory));
                prop_assert!(state.scroll_offset <= nav.scroll_width().saturating_sub(nav.visible_width()));
                prop_assert_eq!(state.can_scroll_left, state.scroll_offset > 0);
                let right_limit = nav.scroll_width() as i64 - nav.visible_width() as i64 - 1;
                prop_assert_eq!(state.can_scroll_right, (state.scroll_offset as i64) < right_limit);
                prop_assert!(nav.focused_card() < nav.cards().len());
            }
        }
    }
}
