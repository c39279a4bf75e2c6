use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};

use crate::backends::InputBackend;
use crate::color::Color;
use crate::error::PaintError;
use crate::pixmap::PixelImage;

use super::control::{FailOnDrop, PaintHandle, PaintState, Start};
use super::mapper::CoordinateMapper;
use super::navigator::PaletteNavigator;
use super::planner::{build_plan, ColorGroup, Plan, Region};

/// What to paint and where to begin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintOptions {
    pub region: Option<Region>,
    /// 1-based index of the first color group to paint.
    pub start_color_index: usize,
    /// Colors left unpainted (the canvas already shows them).
    pub background: Vec<Color>,
}

impl Default for PaintOptions {
    fn default() -> Self {
        Self {
            region: None,
            start_color_index: 1,
            background: Vec::new(),
        }
    }
}

/// Worker-side pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTiming {
    /// Upper bound on one pause wait before flags are rechecked.
    pub pause_poll: Duration,
    /// Report every N pixels; `None` reports about ten times per group.
    pub progress_interval: Option<usize>,
}

impl Default for EngineTiming {
    fn default() -> Self {
        Self {
            pause_poll: Duration::from_millis(10),
            progress_interval: None,
        }
    }
}

/// Snapshot passed to the progress callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub pixels_done: usize,
    pub pixels_total: usize,
    pub color: Color,
    /// 1-based.
    pub group_index: usize,
    pub group_count: usize,
    /// Palette page of the color; `None` when the group was skipped.
    pub category: Option<u32>,
}

/// Progress callback, invoked on the worker thread.
pub type ProgressFn = Box<dyn FnMut(&Progress) + Send>;

/// Outcome of a job that ended in `Completed` or `Stopped`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintReport {
    pub state: PaintState,
    pub pixels_done: usize,
    pub pixels_total: usize,
    pub clicks_ok: usize,
    pub clicks_failed: usize,
    pub groups_painted: usize,
    pub groups_skipped: usize,
    /// Color group to pass as the start index to finish a stopped job.
    pub resume_at: Option<usize>,
}

/// Walks a paint plan: select each group's color, then click its pixels.
///
/// One engine runs one job. After the job ends, whatever the outcome, the
/// engine refuses to start again.
pub struct PaintEngine<B: InputBackend> {
    input: B,
    mapper: CoordinateMapper,
    navigator: Option<PaletteNavigator>,
    timing: EngineTiming,
    handle: PaintHandle,
    on_progress: Option<ProgressFn>,
}

impl<B: InputBackend> PaintEngine<B> {
    /// `navigator` is `None` while the palette is not calibrated; the
    /// engine then refuses to start.
    pub fn new(input: B, mapper: CoordinateMapper, navigator: Option<PaletteNavigator>) -> Self {
        Self {
            input,
            mapper,
            navigator,
            timing: EngineTiming::default(),
            handle: PaintHandle::new(),
            on_progress: None,
        }
    }

    pub fn with_timing(mut self, timing: EngineTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn on_progress(mut self, callback: impl FnMut(&Progress) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Remote control for the job this engine runs.
    pub fn handle(&self) -> PaintHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> PaintState {
        self.handle.state()
    }

    pub fn navigator(&self) -> Option<&PaletteNavigator> {
        self.navigator.as_ref()
    }

    /// Give back the input backend, e.g. to inspect a recording.
    pub fn into_input(self) -> B {
        self.input
    }

    fn emit(&mut self, progress: Progress) {
        if let Some(callback) = self.on_progress.as_mut() {
            callback(&progress);
        }
    }

    /// Check everything that can be known before the first click: both
    /// calibrations, the region and a non-empty plan.
    ///
    /// Sends no input and leaves the job state untouched.
    pub fn validate(&self, image: &PixelImage, options: &PaintOptions) -> Result<Plan, PaintError> {
        self.mapper.require_calibration()?;
        if self.navigator.is_none() {
            return Err(PaintError::NotCalibrated(
                "palette (color_left_btn/color_right_btn/color_positions)",
            ));
        }

        if let Some(region) = options.region {
            region.clip(image.width(), image.height())?;
        }
        let plan = build_plan(image, options.region, &options.background);
        if plan.is_empty() {
            return Err(PaintError::EmptyPlan);
        }
        Ok(plan)
    }

    /// Paint `image` on the calling thread until done, stopped or failed.
    ///
    /// Preconditions (calibration, non-empty plan) are checked before any
    /// input is sent; those errors leave the engine idle. A stop requested
    /// before the job starts yields a `Stopped` report without any input.
    pub fn run(&mut self, image: &PixelImage, options: &PaintOptions) -> Result<PaintReport, PaintError> {
        self.handle.ensure_idle().map_err(PaintError::EngineSpent)?;
        let plan = self.validate(image, options)?;

        let group_count = plan.groups.len();
        let start = match options.start_color_index {
            0 => 1,
            n if n > group_count => {
                warn!("start color {n} exceeds {group_count} color groups, starting from 1");
                1
            }
            n => n,
        };
        let skipped: usize = plan.groups[..start - 1].iter().map(ColorGroup::len).sum();
        let total = plan.total_pixels();

        info!(
            "painting {}x{} image: {} color group(s), {} pixel(s){}",
            image.width(),
            image.height(),
            group_count,
            total,
            options
                .region
                .map(|r| format!(", region [{}, {}] size {}", r.start_row, r.start_col, r.size))
                .unwrap_or_default()
        );
        if start > 1 {
            info!("resuming at color {start}: {skipped} pixel(s) already done");
        }

        match self
            .handle
            .begin(skipped, total)
            .map_err(PaintError::EngineSpent)?
        {
            Start::Run => {}
            Start::Cancelled => {
                info!("stopped before the first click");
                return Ok(PaintReport {
                    state: PaintState::Stopped,
                    pixels_done: skipped,
                    pixels_total: total,
                    clicks_ok: 0,
                    clicks_failed: 0,
                    groups_painted: 0,
                    groups_skipped: 0,
                    resume_at: Some(start),
                });
            }
        }
        let handle = self.handle.clone();
        let guard = FailOnDrop::new(&handle);
        let report = self.paint(&plan, start, skipped);
        drop(guard);
        report
    }

    fn paint(&mut self, plan: &Plan, start: usize, skipped: usize) -> Result<PaintReport, PaintError> {
        let group_count = plan.groups.len();
        let mut report = PaintReport {
            state: PaintState::Running,
            pixels_done: skipped,
            pixels_total: plan.total_pixels(),
            clicks_ok: 0,
            clicks_failed: 0,
            groups_painted: 0,
            groups_skipped: 0,
            resume_at: None,
        };

        let mut interrupted = false;
        'groups: for (i, group) in plan.groups.iter().enumerate().skip(start - 1) {
            let group_index = i + 1;
            // Page turns and slot clicks count as input too.
            if !self.handle.wait_while_paused(self.timing.pause_poll) {
                interrupted = true;
                report.resume_at = Some(group_index);
                break;
            }
            info!(
                "[{group_index}/{group_count}] {} ({} px)",
                group.color,
                group.len()
            );

            let selected = match self.navigator.as_mut() {
                Some(navigator) => navigator.select_color(&mut self.input, group.color),
                None => Err(PaintError::NotCalibrated("palette")),
            };
            let category = match selected {
                Ok(resolved) => resolved.position.category,
                Err(PaintError::Input(err)) if err.is_fatal() => return Err(err.into()),
                Err(err) => {
                    warn!("skipping {}: color selection failed: {err}", group.color);
                    report.pixels_done += group.len();
                    report.groups_skipped += 1;
                    self.handle.publish_done(report.pixels_done);
                    self.emit(Progress {
                        pixels_done: report.pixels_done,
                        pixels_total: report.pixels_total,
                        color: group.color,
                        group_index,
                        group_count,
                        category: None,
                    });
                    continue;
                }
            };

            let every = self
                .timing
                .progress_interval
                .unwrap_or(group.len() / 10)
                .max(1);
            for (n, &pixel) in group.pixels.iter().enumerate() {
                if !self.handle.wait_while_paused(self.timing.pause_poll) {
                    info!("stopped at pixel {n}/{} of {}", group.len(), group.color);
                    interrupted = true;
                    report.resume_at = Some(group_index);
                    break 'groups;
                }

                let (row, col) = plan.absolute(pixel);
                let point = self
                    .mapper
                    .map_pixel(row, col, plan.image_width, plan.image_height)?;
                match self.input.click(point) {
                    Ok(()) => report.clicks_ok += 1,
                    Err(err) if err.is_fatal() => return Err(err.into()),
                    Err(err) => {
                        warn!("pixel ({row}, {col}) at {point}: {err}");
                        report.clicks_failed += 1;
                    }
                }

                report.pixels_done += 1;
                self.handle.publish_done(report.pixels_done);
                if n % every == 0 {
                    self.emit(Progress {
                        pixels_done: report.pixels_done,
                        pixels_total: report.pixels_total,
                        color: group.color,
                        group_index,
                        group_count,
                        category: Some(category),
                    });
                }
            }

            report.groups_painted += 1;
            debug!("finished {} on page {category}", group.color);
            self.emit(Progress {
                pixels_done: report.pixels_done,
                pixels_total: report.pixels_total,
                color: group.color,
                group_index,
                group_count,
                category: Some(category),
            });
        }

        report.state = if interrupted {
            PaintState::Stopped
        } else {
            PaintState::Completed
        };
        self.handle.finish(report.state);
        info!(
            "{}: {}/{} pixel(s), {} failed click(s), {} skipped group(s)",
            report.state,
            report.pixels_done,
            report.pixels_total,
            report.clicks_failed,
            report.groups_skipped
        );
        Ok(report)
    }
}

impl<B: InputBackend + 'static> PaintEngine<B> {
    /// Run the job on a dedicated worker thread.
    ///
    /// The engine is handed back with the result so its backend can be
    /// inspected afterwards.
    pub fn spawn(
        mut self,
        image: PixelImage,
        options: PaintOptions,
    ) -> std::io::Result<(PaintHandle, JoinHandle<(Self, Result<PaintReport, PaintError>)>)> {
        let handle = self.handle();
        let worker = thread::Builder::new()
            .name("paint-worker".into())
            .spawn(move || {
                let result = self.run(&image, &options);
                // Release whatever the callback holds, e.g. a channel sender.
                self.on_progress = None;
                (self, result)
            })?;
        Ok((handle, worker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::backends::dry_run::{DryRunBackend, RecordedInput};
    use crate::catalog::PaletteCatalog;
    use crate::error::InputError;
    use crate::geometry::ScreenPoint;
    use crate::paint::mapper::CanvasCalibration;
    use crate::paint::navigator::{NavigatorTiming, PaletteCalibration};

    const PREV: ScreenPoint = ScreenPoint::new(1900, 0);
    const NEXT: ScreenPoint = ScreenPoint::new(2000, 0);

    fn slot(i: i32) -> ScreenPoint {
        ScreenPoint::new(1000 + i, 1000)
    }

    fn hex(s: &str) -> Color {
        Color::from_hex(s).unwrap()
    }

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(
            CanvasCalibration::new(ScreenPoint::new(0, 0), ScreenPoint::new(100, 100)).unwrap(),
        )
    }

    fn navigator(slots: i32) -> PaletteNavigator {
        PaletteNavigator::new(
            PaletteCatalog::reference(),
            PaletteCalibration {
                prev_page_button: PREV,
                next_page_button: NEXT,
                slot_positions: (0..slots).map(slot).collect(),
            },
            NavigatorTiming {
                page_settle: Duration::ZERO,
                slot_settle: Duration::ZERO,
            },
        )
    }

    fn timing() -> EngineTiming {
        EngineTiming {
            pause_poll: Duration::from_millis(1),
            progress_interval: Some(1),
        }
    }

    fn engine<B: InputBackend>(input: B, slots: i32) -> PaintEngine<B> {
        PaintEngine::new(input, mapper(), Some(navigator(slots))).with_timing(timing())
    }

    fn clicks(log: &Arc<Mutex<Vec<RecordedInput>>>) -> Vec<ScreenPoint> {
        log.lock()
            .unwrap()
            .iter()
            .filter_map(|r| match r {
                RecordedInput::Click(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    fn image(rows: &[Vec<&str>]) -> PixelImage {
        PixelImage::from_hex_rows(rows).unwrap()
    }

    /// Clicks everything, failing on the listed points.
    struct Flaky {
        clicked: Vec<ScreenPoint>,
        fail: Vec<(ScreenPoint, InputError)>,
    }

    impl InputBackend for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn click(&mut self, point: ScreenPoint) -> Result<(), InputError> {
            self.clicked.push(point);
            match self.fail.iter().find(|(p, _)| *p == point) {
                Some((_, err)) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn checkerboard_paints_foreground_only() {
        let input = DryRunBackend::new();
        let log = input.log();
        let mut engine = engine(input, 10);
        let options = PaintOptions {
            background: vec![hex("#FFFFFF")],
            ..PaintOptions::default()
        };

        let report = engine
            .run(&image(&[vec!["#000000", "#FFFFFF"], vec!["#ffffff", "#000000"]]), &options)
            .unwrap();

        // #000000 resolves to #051616, page 1 slot 0.
        assert_eq!(
            clicks(&log),
            vec![slot(0), ScreenPoint::new(0, 0), ScreenPoint::new(50, 50)]
        );
        assert_eq!(report.state, PaintState::Completed);
        assert_eq!((report.pixels_done, report.pixels_total), (2, 2));
        assert_eq!(report.clicks_ok, 2);
        assert_eq!(report.resume_at, None);
        assert_eq!(engine.state(), PaintState::Completed);
        assert_eq!(engine.handle().progress(), (2, 2));
    }

    #[test]
    fn start_index_resumes_with_skipped_pixels_counted() {
        let input = DryRunBackend::new();
        let log = input.log();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut engine = engine(input, 10).on_progress(move |p| {
            sink.lock().unwrap().push(p.pixels_done);
        });
        let options = PaintOptions {
            start_color_index: 2,
            ..PaintOptions::default()
        };

        let report = engine
            .run(&image(&[vec!["#051616", "#CF354D", "#051616"]]), &options)
            .unwrap();

        assert_eq!(clicks(&log), vec![NEXT, slot(0), ScreenPoint::new(33, 0)]);
        assert_eq!((report.pixels_done, report.pixels_total), (3, 3));
        assert_eq!(report.groups_painted, 1);
        assert!(seen.lock().unwrap().iter().all(|&done| done >= 2));
    }

    #[test]
    fn out_of_range_start_index_restarts_from_first_color() {
        for start in [0, 3] {
            let input = DryRunBackend::new();
            let log = input.log();
            let mut engine = engine(input, 10);
            let options = PaintOptions {
                start_color_index: start,
                ..PaintOptions::default()
            };
            let report = engine
                .run(&image(&[vec!["#051616", "#CF354D"]]), &options)
                .unwrap();
            assert_eq!(report.groups_painted, 2, "start {start}");
            assert_eq!(clicks(&log)[0], slot(0));
        }
    }

    #[test]
    fn unreachable_slot_skips_the_group() {
        let input = DryRunBackend::new();
        let log = input.log();
        let skipped = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&skipped);
        // #69313B sits in slot 6 of page 2; only six slots are calibrated.
        let mut engine = engine(input, 6).on_progress(move |p| {
            if p.category.is_none() {
                sink.lock().unwrap().push(p.color);
            }
        });

        let report = engine
            .run(
                &image(&[vec!["#69313B", "#051616"]]),
                &PaintOptions::default(),
            )
            .unwrap();

        assert_eq!(report.state, PaintState::Completed);
        assert_eq!(report.groups_skipped, 1);
        assert_eq!(report.groups_painted, 1);
        assert_eq!(report.pixels_done, report.pixels_total);
        assert_eq!(*skipped.lock().unwrap(), vec![hex("#69313B")]);
        assert_eq!(clicks(&log), vec![slot(0), ScreenPoint::new(50, 0)]);
    }

    #[test]
    fn failed_pixel_clicks_are_counted_and_skipped() {
        let input = Flaky {
            clicked: Vec::new(),
            fail: vec![(
                ScreenPoint::new(50, 0),
                InputError::Injection("busy".into()),
            )],
        };
        let mut engine = engine(input, 10);
        let report = engine
            .run(&image(&[vec!["#051616", "#051616"]]), &PaintOptions::default())
            .unwrap();

        assert_eq!(report.state, PaintState::Completed);
        assert_eq!((report.clicks_ok, report.clicks_failed), (1, 1));
        assert_eq!(report.pixels_done, 2);
    }

    #[test]
    fn lost_window_fails_the_job() {
        let input = Flaky {
            clicked: Vec::new(),
            fail: vec![(
                ScreenPoint::new(0, 0),
                InputError::WindowLost("closed".into()),
            )],
        };
        let mut engine = engine(input, 10);
        let err = engine
            .run(&image(&[vec!["#051616", "#051616"]]), &PaintOptions::default())
            .unwrap_err();

        assert!(matches!(err, PaintError::Input(InputError::WindowLost(_))));
        assert_eq!(engine.state(), PaintState::Failed);
        assert_eq!(engine.into_input().clicked, vec![slot(0), ScreenPoint::new(0, 0)]);
    }

    #[test]
    fn stop_ends_the_job_between_pixels() {
        let input = DryRunBackend::new();
        let log = input.log();
        let engine = engine(input, 10);
        let remote = engine.handle();
        let mut engine = engine.on_progress(move |p| {
            if p.pixels_done == 2 {
                remote.stop();
            }
        });

        let report = engine
            .run(
                &image(&[vec!["#051616", "#051616", "#051616", "#051616"]]),
                &PaintOptions::default(),
            )
            .unwrap();

        assert_eq!(report.state, PaintState::Stopped);
        assert_eq!((report.pixels_done, report.pixels_total), (2, 4));
        assert_eq!(report.resume_at, Some(1));
        assert_eq!(clicks(&log).len(), 3);
        assert_eq!(engine.state(), PaintState::Stopped);
    }

    #[test]
    fn pause_and_resume_neither_skip_nor_repeat_pixels() {
        let input = DryRunBackend::new();
        let log = input.log();
        let engine = engine(input, 10);
        let remote = engine.handle();
        let engine = engine.on_progress(move |p| {
            if p.pixels_done == 2 {
                remote.pause();
            }
        });

        let row = vec!["#051616"; 5];
        let (handle, worker) = engine
            .spawn(image(&[row]), PaintOptions::default())
            .unwrap();

        while handle.state() != PaintState::Paused {
            std::thread::sleep(Duration::from_millis(1));
        }
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(handle.progress(), (2, 5));
        assert!(handle.resume());

        let (_engine, result) = worker.join().unwrap();
        let report = result.unwrap();
        assert_eq!(report.state, PaintState::Completed);
        assert_eq!(
            clicks(&log),
            vec![
                slot(0),
                ScreenPoint::new(0, 0),
                ScreenPoint::new(20, 0),
                ScreenPoint::new(40, 0),
                ScreenPoint::new(60, 0),
                ScreenPoint::new(80, 0),
            ]
        );
    }

    #[test]
    fn pause_at_a_group_boundary_holds_back_page_turns() {
        let input = DryRunBackend::new();
        let log = input.log();
        let engine = engine(input, 10);
        let remote = engine.handle();
        let engine = engine.on_progress(move |p| {
            if p.group_index == 1 {
                remote.pause();
            }
        });

        // Page 1, then page 13: twelve page turns between the groups.
        let (handle, worker) = engine
            .spawn(image(&[vec!["#051616", "#AD356F"]]), PaintOptions::default())
            .unwrap();

        while handle.state() != PaintState::Paused {
            std::thread::sleep(Duration::from_millis(1));
        }
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(clicks(&log), vec![slot(0), ScreenPoint::new(0, 0)]);
        assert_eq!(handle.state(), PaintState::Paused);
        assert!(handle.resume());

        let (_engine, result) = worker.join().unwrap();
        let report = result.unwrap();
        assert_eq!(report.state, PaintState::Completed);
        assert_eq!(report.groups_painted, 2);

        let clicks = clicks(&log);
        assert_eq!(clicks.len(), 2 + 12 + 2);
        assert!(clicks[2..14].iter().all(|&p| p == NEXT));
        assert_eq!(&clicks[14..], &[slot(0), ScreenPoint::new(50, 0)]);
    }

    #[test]
    fn stop_at_a_group_boundary_resumes_at_the_next_group() {
        let input = DryRunBackend::new();
        let log = input.log();
        let engine = engine(input, 10);
        let remote = engine.handle();
        let mut engine = engine.on_progress(move |p| {
            if p.group_index == 1 {
                remote.stop();
            }
        });

        let report = engine
            .run(&image(&[vec!["#051616", "#AD356F"]]), &PaintOptions::default())
            .unwrap();

        assert_eq!(report.state, PaintState::Stopped);
        assert_eq!(report.resume_at, Some(2));
        assert_eq!(clicks(&log), vec![slot(0), ScreenPoint::new(0, 0)]);
    }

    #[test]
    fn stop_before_start_reports_a_stopped_job() {
        let input = DryRunBackend::new();
        let log = input.log();
        let mut engine = engine(input, 10);
        engine.handle().stop();

        let img = image(&[vec!["#051616", "#CF354D"]]);
        let options = PaintOptions {
            start_color_index: 2,
            ..PaintOptions::default()
        };
        let report = engine.run(&img, &options).unwrap();

        assert_eq!(report.state, PaintState::Stopped);
        assert_eq!((report.pixels_done, report.pixels_total), (1, 2));
        assert_eq!(report.resume_at, Some(2));
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(
            engine.run(&img, &options),
            Err(PaintError::EngineSpent(PaintState::Stopped))
        );
    }

    #[test]
    fn validate_checks_preconditions_without_input() {
        let input = DryRunBackend::new();
        let log = input.log();
        let engine = PaintEngine::new(input, CoordinateMapper::uncalibrated(), Some(navigator(10)));
        let img = image(&[vec!["#051616"]]);
        assert!(matches!(
            engine.validate(&img, &PaintOptions::default()),
            Err(PaintError::NotCalibrated(_))
        ));

        let engine = PaintEngine::new(DryRunBackend::new(), mapper(), Some(navigator(10)));
        let plan = engine.validate(&img, &PaintOptions::default()).unwrap();
        assert_eq!(plan.total_pixels(), 1);
        assert_eq!(engine.state(), PaintState::Idle);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn engine_runs_only_once() {
        let mut engine = engine(DryRunBackend::new(), 10);
        let img = image(&[vec!["#051616"]]);
        engine.run(&img, &PaintOptions::default()).unwrap();
        assert_eq!(
            engine.run(&img, &PaintOptions::default()),
            Err(PaintError::EngineSpent(PaintState::Completed))
        );
    }

    #[test]
    fn missing_calibration_fails_before_any_input() {
        let input = DryRunBackend::new();
        let log = input.log();
        let mut engine = PaintEngine::new(input, CoordinateMapper::uncalibrated(), Some(navigator(10)));
        let img = image(&[vec!["#051616"]]);
        assert!(matches!(
            engine.run(&img, &PaintOptions::default()),
            Err(PaintError::NotCalibrated(_))
        ));
        assert_eq!(engine.state(), PaintState::Idle);

        let mut engine = PaintEngine::new(DryRunBackend::new(), mapper(), None);
        assert!(matches!(
            engine.run(&img, &PaintOptions::default()),
            Err(PaintError::NotCalibrated(_))
        ));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_plans_and_bad_regions_are_rejected_up_front() {
        let input = DryRunBackend::new();
        let log = input.log();
        let mut engine = engine(input, 10);
        let img = image(&[vec!["#F9F6E9", "#F9F6E9"]]);

        let options = PaintOptions {
            background: vec![hex("#F9F6E9")],
            ..PaintOptions::default()
        };
        assert_eq!(engine.run(&img, &options), Err(PaintError::EmptyPlan));

        let options = PaintOptions {
            region: Some(Region::new(5, 5, 2)),
            ..PaintOptions::default()
        };
        assert!(matches!(
            engine.run(&img, &options),
            Err(PaintError::InvalidRegion(_))
        ));
        assert_eq!(engine.state(), PaintState::Idle);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_total() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut engine = engine(DryRunBackend::new(), 10)
            .with_timing(EngineTiming {
                pause_poll: Duration::from_millis(1),
                progress_interval: None,
            })
            .on_progress(move |p| sink.lock().unwrap().push(p.clone()));

        let img = image(&[
            vec!["#051616", "#CF354D", "#051616", "#E95E2B"],
            vec!["#CF354D", "#CF354D", "#051616", "#E95E2B"],
        ]);
        let report = engine.run(&img, &PaintOptions::default()).unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen.windows(2).all(|w| w[0].pixels_done <= w[1].pixels_done));
        let last = seen.last().unwrap();
        assert_eq!(last.pixels_done, 8);
        assert_eq!(last.group_index, last.group_count);
        assert_eq!(report.pixels_done, 8);
    }
}
