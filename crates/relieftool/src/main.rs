use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use relief::{
    GenerateOptions, GenerateRequest, GeneratedMap, GeoCoord, OutputBuffer, OutputFormat,
    Pipeline, TileFetcher,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod settings;

use settings::Settings;

#[derive(Parser)]
#[command(name = "relieftool")]
#[command(about = "Generate game heightmaps from Mapbox terrain tiles", long_about = None)]
struct Cli {
    /// Settings file remembering the last map center and calibration
    #[arg(long, default_value = "relieftool.json")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a heightmap around a map center
    Generate {
        /// Map center longitude (defaults to the stored one)
        #[arg(long)]
        lng: Option<f64>,
        /// Map center latitude (defaults to the stored one)
        #[arg(long)]
        lat: Option<f64>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Raw)]
        format: Format,
        /// Blur the water mask after tapering
        #[arg(long)]
        smoothing: bool,
        /// Stroke waterway lines into the water mask
        #[arg(long)]
        waterways: bool,
        /// Overlay the orientation grid on grayscale output
        #[arg(long)]
        grid: bool,
        /// Force sea level to zero in the derived calibration
        #[arg(long)]
        land_only: bool,
        /// Water-to-land slope band width, in sixteenths of a cell
        #[arg(long, default_value_t = 16.0)]
        slope: f32,
        /// Ignore the stored calibration and derive a fresh one
        #[arg(long)]
        recalibrate: bool,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Measure the elevation range of an area without producing output
    Info {
        #[arg(long)]
        lng: Option<f64>,
        #[arg(long)]
        lat: Option<f64>,
    },
    /// Derive and store a calibration for an area
    Calibrate {
        #[arg(long)]
        lng: Option<f64>,
        #[arg(long)]
        lat: Option<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// 16-bit big-endian heightmap.raw
    Raw,
    /// 8-bit grayscale heightmap.png
    Png,
    /// Terrain-RGB tiles.png at full block resolution
    Tiles,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let token = std::env::var("MAPBOX_TOKEN")
        .context("MAPBOX_TOKEN environment variable is required")?;
    let mut settings = Settings::load(&cli.settings);
    let mut pipeline = Pipeline::new(TileFetcher::new(token));

    match cli.command {
        Commands::Generate {
            lng,
            lat,
            format,
            smoothing,
            waterways,
            grid,
            land_only,
            slope,
            recalibrate,
            out,
        } => {
            let center = resolve_center(&mut settings, lng, lat);
            let request = GenerateRequest {
                center,
                format: Some(match format {
                    Format::Raw => OutputFormat::Raw16,
                    Format::Png => OutputFormat::Gray8,
                    Format::Tiles => OutputFormat::TerrainRgb,
                }),
                options: GenerateOptions {
                    smoothing,
                    draw_waterways: waterways,
                    draw_grid: grid,
                    land_only,
                    water_side_slope: slope,
                },
                calibration: if recalibrate {
                    None
                } else {
                    settings.calibration
                },
            };

            let map = pipeline.generate(request).await?;
            record_run(&mut settings, &map);

            let filename = match format {
                Format::Raw => "heightmap.raw",
                Format::Png => "heightmap.png",
                Format::Tiles => "tiles.png",
            };
            let path = out.join(filename);
            save_output(&map, &path)?;
            println!("wrote {}", path.display());
            println!(
                "elevation range {:.1} m to {:.1} m",
                map.min_height, map.max_height
            );
        }
        Commands::Info { lng, lat } => {
            let center = resolve_center(&mut settings, lng, lat);
            let map = run_info(&mut pipeline, center).await?;
            record_run(&mut settings, &map);

            println!("center    {:.5}, {:.5}", center.lon, center.lat);
            println!("min height {:.1} m", map.min_height);
            println!("max height {:.1} m", map.max_height);
        }
        Commands::Calibrate { lng, lat } => {
            let center = resolve_center(&mut settings, lng, lat);
            let map = run_info(&mut pipeline, center).await?;
            record_run(&mut settings, &map);
            settings.calibration = map.calibration;

            if let Some(cal) = &map.calibration {
                println!("base level   {:.1} m", cal.base_level);
                println!("height scale {:.0} %", cal.height_scale);
                println!("sea level    {:.1} m", cal.sea_level);
            }
        }
    }

    settings.save(&cli.settings)?;
    Ok(())
}

/// Pipeline run without an output buffer, for measurement only
async fn run_info(pipeline: &mut Pipeline, center: GeoCoord) -> Result<GeneratedMap> {
    let request = GenerateRequest {
        center,
        format: None,
        options: GenerateOptions::default(),
        calibration: None,
    };
    Ok(pipeline.generate(request).await?)
}

fn resolve_center(settings: &mut Settings, lng: Option<f64>, lat: Option<f64>) -> GeoCoord {
    if let Some(lng) = lng {
        settings.lng = lng;
    }
    if let Some(lat) = lat {
        settings.lat = lat;
    }
    GeoCoord::new(settings.lat, settings.lng)
}

fn record_run(settings: &mut Settings, map: &GeneratedMap) {
    settings.min_height = map.min_height;
    settings.max_height = map.max_height;
    info!(
        min = map.min_height,
        max = map.max_height,
        "generation finished"
    );
}

fn save_output(map: &GeneratedMap, path: &Path) -> Result<()> {
    match &map.output {
        Some(OutputBuffer::Raw(bytes)) => {
            fs::write(path, bytes)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        Some(OutputBuffer::Image(image)) => {
            image
                .save(path)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        None => {}
    }
    Ok(())
}
