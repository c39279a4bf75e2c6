use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use log::{info, warn};

use pixel_painter::backends::select_backend;
use pixel_painter::calibrate;
use pixel_painter::catalog::PaletteCatalog;
use pixel_painter::cli::{Args, Command, ImageArgs, PaintArgs, TargetArgs};
use pixel_painter::color::{parse_color_list, Color};
use pixel_painter::config::{Config, DEFAULT_BACKGROUND};
use pixel_painter::error::PaintError;
use pixel_painter::logging::{init_logging, LoggingConfig, DEFAULT_LOG_FILE};
use pixel_painter::paint::{
    build_plan, click_reference_points, PaintOptions, PaintState, Progress,
};
use pixel_painter::pixmap::PixelImage;
use pixel_painter::tui::Monitor;

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load_or_default(&args.config)?;

    let monitor = matches!(&args.command, Command::Paint(paint) if !paint.no_tui);
    init_logging(LoggingConfig {
        env_filter: LoggingConfig::verbosity(args.verbose).or_else(|| config.log_filter.clone()),
        log_file: monitor.then(|| PathBuf::from(DEFAULT_LOG_FILE)),
        ..LoggingConfig::default()
    })?;

    match args.command {
        Command::Paint(paint_args) => paint(&config, paint_args),
        Command::Plan(plan_args) => plan(&config, &plan_args.image),
        Command::TestPoints { image, target } => test_points(&config, &image, &target),
        Command::Colors {
            list,
            apply,
            target,
        } => colors(&config, &list, apply, &target),
        Command::Calibrate {
            slots,
            only,
            window,
        } => {
            let input = select_backend(false, window.as_deref())?;
            let steps = calibrate::steps(only, slots);
            calibrate::capture(
                input.as_ref(),
                &steps,
                io::stdin().lock(),
                io::stdout(),
                &mut config,
            )?;
            config.save(&args.config)
        }
        Command::Palette => {
            print_palette(&catalog(&config));
            Ok(())
        }
    }
}

fn catalog(config: &Config) -> PaletteCatalog {
    PaletteCatalog::reference().with_match_mode(config.match_mode)
}

/// Colors from the command line win over the configured ones.
fn background(config: &Config, image: &ImageArgs) -> Vec<Color> {
    if image.background.is_empty() {
        config.background_colors.clone()
    } else {
        image.background.clone()
    }
}

fn load_image(path: &Path, background: &[Color]) -> Result<PixelImage> {
    let transparent = background.first().copied().unwrap_or(DEFAULT_BACKGROUND);
    let image = PixelImage::load(path, transparent)?;
    info!(
        "loaded {}: {}x{}, {} distinct color(s)",
        path.display(),
        image.width(),
        image.height(),
        image.distinct_colors()
    );
    Ok(image)
}

fn countdown(seconds: u64) {
    for remaining in (1..=seconds).rev() {
        println!("Starting in {remaining}... switch to the drawing window");
        thread::sleep(Duration::from_secs(1));
    }
}

fn paint(config: &Config, args: PaintArgs) -> Result<()> {
    let background = background(config, &args.image);
    let image = load_image(&args.image.image, &background)?;
    let input = select_backend(args.target.dry_run, args.target.window.as_deref())?;

    let (tx, rx) = mpsc::channel::<Progress>();
    let use_monitor = !args.no_tui;
    let engine = config.engine(input, catalog(config))?.on_progress(move |p| {
        if use_monitor {
            // The monitor may already be gone; the job carries on regardless.
            let _ = tx.send(p.clone());
        } else {
            println!(
                "{}/{} | color {}/{} {}",
                p.pixels_done, p.pixels_total, p.group_index, p.group_count, p.color
            );
        }
    });

    let options = PaintOptions {
        region: args.image.region,
        start_color_index: args.start_color,
        background,
    };

    // Fail now rather than after the user has switched windows.
    engine.validate(&image, &options)?;
    countdown(args.countdown);
    let title = args.image.image.display().to_string();
    let (handle, worker) = engine.spawn(image, options)?;
    if use_monitor {
        if let Err(err) = Monitor::new(title, handle.clone(), rx).run() {
            handle.stop();
            warn!("monitor failed: {err:#}");
        }
    }

    let (_, result) = worker
        .join()
        .map_err(|_| anyhow!("paint worker panicked"))?;
    let report = result?;
    println!(
        "{}: {}/{} pixel(s) painted, {} click(s) failed, {} color(s) skipped",
        report.state,
        report.pixels_done,
        report.pixels_total,
        report.clicks_failed,
        report.groups_skipped
    );
    if let (PaintState::Stopped, Some(index)) = (report.state, report.resume_at) {
        println!("Resume with --start-color {index}");
    }
    Ok(())
}

fn plan(config: &Config, args: &ImageArgs) -> Result<()> {
    let background = background(config, args);
    let image = load_image(&args.image, &background)?;
    if let Some(region) = args.region {
        region.clip(image.width(), image.height())?;
    }
    let plan = build_plan(&image, args.region, &background);
    if plan.is_empty() {
        return Err(PaintError::EmptyPlan.into());
    }

    let catalog = catalog(config);
    println!("{:>4}  {:<8} {:>7}  {:>4} {:>4}  match", "#", "color", "pixels", "page", "slot");
    for (i, group) in plan.groups.iter().enumerate() {
        let resolved = catalog.resolve(group.color);
        let matched = if resolved.exact {
            "exact".to_string()
        } else {
            format!("nearest {}", resolved.color)
        };
        println!(
            "{:>4}  {:<8} {:>7}  {:>4} {:>4}  {matched}",
            i + 1,
            group.color,
            group.len(),
            resolved.position.category,
            resolved.position.index + 1
        );
    }
    println!(
        "{} color group(s), {} pixel(s)",
        plan.groups.len(),
        plan.total_pixels()
    );
    Ok(())
}

fn test_points(config: &Config, image: &Path, target: &TargetArgs) -> Result<()> {
    let image = load_image(image, &config.background_colors)?;
    let mapper = config.mapper()?;
    let mut input = select_backend(target.dry_run, target.window.as_deref())?;
    let clicked = click_reference_points(
        input.as_mut(),
        &mapper,
        image.width(),
        image.height(),
        config.timing.reference_gap(),
    )?;
    for (point, screen) in clicked {
        println!(
            "{:<12} pixel ({}, {}) -> {screen}",
            point.label, point.row, point.col
        );
    }
    Ok(())
}

fn colors(config: &Config, list: &str, apply: bool, target: &TargetArgs) -> Result<()> {
    let colors = parse_color_list(list)?;
    if colors.is_empty() {
        return Err(anyhow!("no valid #RRGGBB colors in '{list}'"));
    }

    let catalog = catalog(config);
    for (i, &color) in colors.iter().enumerate() {
        let resolved = catalog.resolve(color);
        println!(
            "{:>3}. {color} -> page {} slot {}{}",
            i + 1,
            resolved.position.category,
            resolved.position.index + 1,
            if resolved.exact {
                String::new()
            } else {
                format!(" (nearest {})", resolved.color)
            }
        );
    }
    if !apply {
        return Ok(());
    }

    let mut navigator = config
        .navigator(catalog)?
        .ok_or(PaintError::NotCalibrated("palette"))?;
    let mut input = select_backend(target.dry_run, target.window.as_deref())?;
    let (mut ok, mut failed) = (0, 0);
    for &color in &colors {
        match navigator.select_color(input.as_mut(), color) {
            Ok(_) => ok += 1,
            Err(PaintError::Input(err)) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!("{color}: {err}");
                failed += 1;
            }
        }
        thread::sleep(config.timing.reference_gap());
    }
    println!("selected {ok}/{} color(s), {failed} failed", colors.len());
    Ok(())
}

fn print_palette(catalog: &PaletteCatalog) {
    for category in 1..=catalog.category_count() as u32 {
        let swatches: Vec<String> = catalog
            .iter()
            .filter(|(position, _)| position.category == category)
            .map(|(_, color)| color.to_hex())
            .collect();
        println!("page {category:>2}: {}", swatches.join(" "));
    }
}
