use std::thread;
use std::time::Duration;

use log::debug;

use crate::backends::InputBackend;
use crate::catalog::{PaletteCatalog, Resolved};
use crate::color::Color;
use crate::error::PaintError;
use crate::geometry::ScreenPoint;

/// Screen positions of the palette widget's controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteCalibration {
    pub prev_page_button: ScreenPoint,
    pub next_page_button: ScreenPoint,
    /// One entry per slot on a page, in slot order.
    pub slot_positions: Vec<ScreenPoint>,
}

impl PaletteCalibration {
    /// Build from optional persisted points.
    pub fn from_parts(
        prev_page_button: Option<ScreenPoint>,
        next_page_button: Option<ScreenPoint>,
        slot_positions: Vec<ScreenPoint>,
    ) -> Result<Self, PaintError> {
        let prev_page_button = prev_page_button
            .ok_or(PaintError::NotCalibrated("previous page button (color_left_btn)"))?;
        let next_page_button = next_page_button
            .ok_or(PaintError::NotCalibrated("next page button (color_right_btn)"))?;
        if slot_positions.is_empty() {
            return Err(PaintError::NotCalibrated("palette slots (color_positions)"));
        }
        Ok(Self {
            prev_page_button,
            next_page_button,
            slot_positions,
        })
    }
}

/// Delays waited out after palette clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigatorTiming {
    /// After each page turn; page animations run asynchronously.
    pub page_settle: Duration,
    /// After clicking a slot.
    pub slot_settle: Duration,
}

impl Default for NavigatorTiming {
    fn default() -> Self {
        Self {
            page_settle: Duration::from_millis(500),
            slot_settle: Duration::from_millis(20),
        }
    }
}

/// Drives the paged palette widget and tracks which page is showing.
///
/// Pages are only reachable by stepping with the prev/next buttons, so the
/// navigator owns the single source of truth for the active page.
#[derive(Debug, Clone)]
pub struct PaletteNavigator {
    catalog: PaletteCatalog,
    calibration: PaletteCalibration,
    timing: NavigatorTiming,
    active_page: u32,
}

impl PaletteNavigator {
    pub fn new(
        catalog: PaletteCatalog,
        calibration: PaletteCalibration,
        timing: NavigatorTiming,
    ) -> Self {
        Self {
            catalog,
            calibration,
            timing,
            active_page: 1,
        }
    }

    pub fn active_page(&self) -> u32 {
        self.active_page
    }

    pub fn catalog(&self) -> &PaletteCatalog {
        &self.catalog
    }

    pub fn calibration(&self) -> &PaletteCalibration {
        &self.calibration
    }

    /// Step to `category` with the fewest page-turn clicks.
    ///
    /// The active page is updated after every successful click, so a
    /// failure part way leaves it pointing at the page actually showing.
    pub fn activate(
        &mut self,
        input: &mut dyn InputBackend,
        category: u32,
    ) -> Result<(), PaintError> {
        if category == self.active_page {
            return Ok(());
        }
        let forward = category > self.active_page;
        let (button, clicks) = if forward {
            (self.calibration.next_page_button, category - self.active_page)
        } else {
            (self.calibration.prev_page_button, self.active_page - category)
        };
        debug!(
            "palette page {} -> {category}: {clicks} {} click(s)",
            self.active_page,
            if forward { "next" } else { "prev" }
        );
        for _ in 0..clicks {
            input.click(button)?;
            thread::sleep(self.timing.page_settle);
            if forward {
                self.active_page += 1;
            } else {
                self.active_page -= 1;
            }
        }
        Ok(())
    }

    /// Click slot `index` on the active page.
    pub fn select_slot(
        &mut self,
        input: &mut dyn InputBackend,
        index: usize,
    ) -> Result<(), PaintError> {
        let point = *self
            .calibration
            .slot_positions
            .get(index)
            .ok_or(PaintError::SlotOutOfRange {
                index,
                slots: self.calibration.slot_positions.len(),
            })?;
        input.click(point)?;
        thread::sleep(self.timing.slot_settle);
        Ok(())
    }

    /// Resolve `color` against the catalog, turn to its page and pick its slot.
    pub fn select_color(
        &mut self,
        input: &mut dyn InputBackend,
        color: Color,
    ) -> Result<Resolved, PaintError> {
        let resolved = self.catalog.resolve(color);
        if !resolved.exact {
            debug!("{color} not in palette, using nearest {}", resolved.color);
        }
        // Reject before turning pages for a slot that cannot be clicked.
        if resolved.position.index >= self.calibration.slot_positions.len() {
            return Err(PaintError::SlotOutOfRange {
                index: resolved.position.index,
                slots: self.calibration.slot_positions.len(),
            });
        }
        self.activate(input, resolved.position.category)?;
        self.select_slot(input, resolved.position.index)?;
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::dry_run::{DryRunBackend, RecordedInput};
    use crate::error::InputError;

    const PREV: ScreenPoint = ScreenPoint::new(10, 900);
    const NEXT: ScreenPoint = ScreenPoint::new(200, 900);

    fn calibration(slots: usize) -> PaletteCalibration {
        PaletteCalibration {
            prev_page_button: PREV,
            next_page_button: NEXT,
            slot_positions: (0..slots)
                .map(|i| ScreenPoint::new(30 + 15 * i as i32, 950))
                .collect(),
        }
    }

    fn navigator(slots: usize) -> PaletteNavigator {
        PaletteNavigator::new(
            PaletteCatalog::reference(),
            calibration(slots),
            NavigatorTiming {
                page_settle: Duration::ZERO,
                slot_settle: Duration::ZERO,
            },
        )
    }

    fn clicks(log: &[RecordedInput]) -> Vec<ScreenPoint> {
        log.iter()
            .filter_map(|r| match r {
                RecordedInput::Click(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn activating_current_page_is_a_no_op() {
        let mut nav = navigator(10);
        let mut input = DryRunBackend::new();
        let log = input.log();
        nav.activate(&mut input, 1).unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn forward_then_back_uses_minimal_clicks() {
        let mut nav = navigator(10);
        let mut input = DryRunBackend::new();
        let log = input.log();

        nav.activate(&mut input, 4).unwrap();
        assert_eq!(nav.active_page(), 4);
        nav.activate(&mut input, 2).unwrap();
        assert_eq!(nav.active_page(), 2);

        assert_eq!(
            clicks(&log.lock().unwrap()),
            vec![NEXT, NEXT, NEXT, PREV, PREV]
        );
    }

    #[test]
    fn select_color_turns_page_then_clicks_slot() {
        let mut nav = navigator(10);
        let mut input = DryRunBackend::new();
        let log = input.log();

        // #F5ACA6 is page 2, slot 3.
        let resolved = nav
            .select_color(&mut input, Color::from_hex("#f5aca6").unwrap())
            .unwrap();
        assert!(resolved.exact);
        assert_eq!(resolved.position.category, 2);
        assert_eq!(
            clicks(&log.lock().unwrap()),
            vec![NEXT, ScreenPoint::new(75, 950)]
        );
    }

    #[test]
    fn slot_beyond_calibration_is_rejected_without_clicking() {
        let mut nav = navigator(6);
        let mut input = DryRunBackend::new();
        let log = input.log();

        // #69313B is page 2, slot 6.
        let err = nav
            .select_color(&mut input, Color::from_hex("#69313B").unwrap())
            .unwrap_err();
        assert_eq!(err, PaintError::SlotOutOfRange { index: 6, slots: 6 });
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(nav.active_page(), 1);

        assert!(matches!(
            nav.select_slot(&mut input, 6),
            Err(PaintError::SlotOutOfRange { .. })
        ));
    }

    struct FailAfter {
        remaining: usize,
    }

    impl InputBackend for FailAfter {
        fn name(&self) -> &str {
            "fail-after"
        }

        fn click(&mut self, _point: ScreenPoint) -> Result<(), InputError> {
            if self.remaining == 0 {
                return Err(InputError::Injection("rejected".into()));
            }
            self.remaining -= 1;
            Ok(())
        }
    }

    #[test]
    fn failed_page_turn_keeps_page_accurate() {
        let mut nav = navigator(10);
        let mut input = FailAfter { remaining: 2 };
        let err = nav.activate(&mut input, 6).unwrap_err();
        assert!(matches!(err, PaintError::Input(InputError::Injection(_))));
        assert_eq!(nav.active_page(), 3);
    }

    #[test]
    fn missing_palette_points_are_not_calibrated() {
        assert!(matches!(
            PaletteCalibration::from_parts(None, Some(NEXT), vec![NEXT]),
            Err(PaintError::NotCalibrated(_))
        ));
        assert!(matches!(
            PaletteCalibration::from_parts(Some(PREV), Some(NEXT), vec![]),
            Err(PaintError::NotCalibrated(_))
        ));
        assert!(PaletteCalibration::from_parts(Some(PREV), Some(NEXT), vec![NEXT]).is_ok());
    }
}
