use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use colorcube::{image::io::Reader as ImageReader, ColorCube, Order};
use std::path::PathBuf;

/// Print the dominant colors of an image.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Image file to process
    image: PathBuf,

    /// Number of colors to print at most
    #[arg(short = 'n', long, default_value_t = 10)]
    count: usize,

    /// The image is scaled to this width and height before processing
    #[arg(long, default_value_t = 50)]
    size: u32,

    #[arg(long, default_value_t = colorcube::DEFAULT_RESOLUTION)]
    resolution: usize,

    #[arg(long, default_value_t = colorcube::DEFAULT_DISTINCT_THRESHOLD)]
    distinct_threshold: f64,

    #[arg(long, default_value_t = colorcube::DEFAULT_BRIGHT_THRESHOLD)]
    bright_threshold: f64,

    /// Keep dark colors instead of bright ones
    #[arg(long, conflicts_with = "bright_threshold")]
    dark: bool,

    /// Color to keep the results away from, as R,G,B
    #[arg(long, default_value = "255,255,255", value_parser = parse_color)]
    avoid: (u8, u8, u8),

    /// Don't avoid any color
    #[arg(long)]
    no_avoid: bool,

    #[arg(long, value_enum, default_value_t = CliOrder::Frequency)]
    order: CliOrder,

    /// Adapt the distinctness threshold to find `count` colors that differ as much as possible
    #[arg(long)]
    adaptive: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOrder {
    Frequency,
    Brightness,
    Darkness,
}

impl From<CliOrder> for Order {
    fn from(order: CliOrder) -> Self {
        match order {
            CliOrder::Frequency => Order::Frequency,
            CliOrder::Brightness => Order::Brightness,
            CliOrder::Darkness => Order::Darkness,
        }
    }
}

fn parse_color(s: &str) -> Result<(u8, u8, u8)> {
    let channels = s
        .split(',')
        .map(|channel| channel.trim().parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid color {:?}", s))?;

    match channels[..] {
        [r, g, b] => Ok((r, g, b)),
        _ => bail!("expected a color as R,G,B, got {:?}", s),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut builder = ColorCube::builder()
        .resolution(cli.resolution)
        .distinct_threshold(cli.distinct_threshold)
        .bright_threshold(cli.bright_threshold)
        .order(cli.order.into());

    if cli.dark {
        builder = builder.only_dark_colors();
    }

    if !cli.no_avoid {
        builder = builder.avoid_color(cli.avoid);
    }

    let mut cube = builder.build().context("invalid color cube settings")?;

    let img = ImageReader::open(&cli.image)
        .with_context(|| format!("failed to open {}", cli.image.display()))?
        .decode()
        .with_context(|| format!("failed to decode {}", cli.image.display()))?;

    // scaling down makes the analysis faster and favours colors that dominate perceptually
    let buf = colorcube::image::imageops::resize(
        &img.to_rgba8(),
        cli.size,
        cli.size,
        colorcube::image::imageops::FilterType::CatmullRom,
    );
    log::info!("analyzing {} at {}x{}", cli.image.display(), cli.size, cli.size);

    let colors = if cli.adaptive {
        let pixels = buf.pixels().map(|pixel| pixel.0);
        cube.get_colors_with_count(pixels, cli.count)?
    } else {
        cube.get_image_colors(&buf)?
    };

    if colors.is_empty() {
        log::warn!("no colors found");
    }

    for (r, g, b) in colors.into_iter().take(cli.count) {
        println!("[{}, {}, {}]", r, g, b);
    }

    Ok(())
}
