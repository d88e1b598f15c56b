//! glyphmosaic CLI - Convert images to text art matched against a monospaced font

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use glyphmosaic::color::console_color_map;
use glyphmosaic::generate::Generator;
use glyphmosaic::{
    ColorMode, FontdueRenderer, GenerateConfig, Granularity, MosaicError, SignatureDatabase,
};

#[derive(Parser)]
#[command(name = "glyphmosaic", about = "Convert images to text art")]
struct Args {
    /// Input image file
    input: PathBuf,
    /// Output width in characters (0 = derive from height)
    #[arg(short, long)]
    width: Option<i32>,
    /// Output height in characters (0 = derive from width)
    #[arg(short = 'H', long)]
    height: Option<i32>,
    /// Monospaced font used to build character signatures
    #[arg(short, long, default_value = "assets/DejaVuSansMono.ttf")]
    font: PathBuf,
    /// Font size in pixels
    #[arg(long, default_value = "16")]
    font_size: f32,
    /// Segments per cell as VxH, e.g. 4x2
    #[arg(short, long)]
    granularity: Option<Granularity>,
    /// Preprocessing: binary, grayscale, dither or color
    #[arg(short, long)]
    mode: Option<ColorMode>,
    /// Candidate characters
    #[arg(short, long)]
    charset: Option<String>,
    /// Use only ASCII characters
    #[arg(short, long)]
    ascii: bool,
    /// Invert the image
    #[arg(short, long)]
    invert: bool,
    /// Colorize output with the nearest console color of each cell
    #[arg(long)]
    color: bool,
    /// JSON settings file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Load signatures from a JSON file instead of rendering the font
    #[arg(long)]
    signatures: Option<PathBuf>,
    /// Write the signatures used for this run to a JSON file
    #[arg(long)]
    save_signatures: Option<PathBuf>,
    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", value_parser = parse_log_level)]
    log_level: log::LevelFilter,
}

fn parse_log_level(s: &str) -> Result<log::LevelFilter, String> {
    s.parse().map_err(|_| {
        format!("unknown log level '{s}' (expected off, error, warn, info, debug or trace)")
    })
}

fn main() -> Result<(), MosaicError> {
    let args = Args::parse();

    env_logger::Builder::new().filter_level(args.log_level).init();

    let mut config = match &args.config {
        Some(path) => GenerateConfig::load(path)?,
        None => GenerateConfig::default(),
    };
    if let Some(width) = args.width {
        config.width = width;
        // An explicit width alone means "derive the height".
        if args.height.is_none() {
            config.height = 0;
        }
    }
    if let Some(height) = args.height {
        config.height = height;
        if args.width.is_none() {
            config.width = 0;
        }
    }
    if let Some(granularity) = args.granularity {
        config.granularity = granularity;
    }
    if let Some(mode) = args.mode {
        config.color_mode = mode;
    }
    if let Some(charset) = args.charset {
        config.charset = charset;
    }
    config.validate()?;

    let mut database = match &args.signatures {
        Some(path) => {
            log::info!("loading signatures from {}", path.display());
            SignatureDatabase::load(path)?
        }
        None => {
            log::info!("rendering signatures with {} at {}px", args.font.display(), args.font_size);
            let renderer = FontdueRenderer::from_file(&args.font, args.font_size)?;
            SignatureDatabase::build(&renderer, &config.characters(), &[config.granularity])?
        }
    };
    if args.ascii {
        database.ascii_only();
    }
    if let Some(path) = &args.save_signatures {
        database.save(path)?;
        log::info!("saved signatures to {}", path.display());
    }

    let mut image = image::open(&args.input)?;
    if args.invert {
        image.invert();
    }

    let generator = Generator::new(Arc::new(database), config);
    let mut artwork = generator.convert(&image)?;
    if args.color {
        let (width, height) = (artwork.width() as u32, artwork.height() as u32);
        let colors = console_color_map(&image.to_rgb8(), width, height);
        artwork = artwork.colored(colors, None)?;
    }

    println!("{}", artwork.render(args.color)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_defaults_to_warn() {
        let args = Args::try_parse_from(["glyphmosaic", "in.png"]).unwrap();
        assert_eq!(args.log_level, log::LevelFilter::Warn);
        assert_eq!(args.font, PathBuf::from("assets/DejaVuSansMono.ttf"));
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let args = Args::try_parse_from(["glyphmosaic", "in.png", "--log-level", "DEBUG"]).unwrap();
        assert_eq!(args.log_level, log::LevelFilter::Debug);
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        assert!(Args::try_parse_from(["glyphmosaic", "in.png", "--log-level", "loud"]).is_err());
    }

    #[test]
    fn granularity_and_mode_flags_parse() {
        let args =
            Args::try_parse_from(["glyphmosaic", "in.png", "-g", "4x2", "-m", "dither"]).unwrap();
        assert_eq!(args.granularity, Some(Granularity::FOUR_BY_TWO));
        assert_eq!(args.mode, Some(ColorMode::Dither));
        assert!(Args::try_parse_from(["glyphmosaic", "in.png", "-m", "sepia"]).is_err());
    }
}
