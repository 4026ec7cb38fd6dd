use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use kicad_draw::geom::BBox;
use kicad_draw::layers::ViewLayerSet;
use kicad_draw::render::{RecordedLayer, RecordingRenderer};
use kicad_draw::{BoardPainter, BoardTheme, SchematicPainter, SchematicTheme};
use kicad_parse::{detect_format, parse_document, DocumentFormat, KicadDocument, ParseOptions};

#[derive(Parser)]
#[command(name = "kicad-dump", about = "Render KiCad documents to JSON draw calls")]
struct Cli {
    /// Input file (.kicad_sch, .kicad_pcb)
    input: PathBuf,

    /// Output JSON file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Fail on unknown top-level records instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Theme JSON file; omitted fields keep the stock palette
    #[arg(long)]
    theme: Option<PathBuf>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ThemeFile {
    schematic: SchematicTheme,
    board: BoardTheme,
}

#[derive(Serialize)]
struct Dump {
    layers: Vec<RecordedLayer>,
    bbox: BBox,
}

fn run(cli: &Cli) -> Result<Dump, String> {
    let format = detect_format(&cli.input).ok_or_else(|| {
        format!(
            "unsupported file extension: {}",
            cli.input.display()
        )
    })?;
    let text = std::fs::read_to_string(&cli.input).map_err(|e| e.to_string())?;
    let themes: ThemeFile = match &cli.theme {
        Some(path) => {
            let data = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
            serde_json::from_str(&data).map_err(|e| e.to_string())?
        }
        None => ThemeFile::default(),
    };

    let opts = ParseOptions { strict: cli.strict };
    let document = parse_document(&text, format, &opts).map_err(|e| e.to_string())?;

    let mut renderer = RecordingRenderer::new();
    match &document {
        KicadDocument::Schematic(sch) => {
            let mut layers = ViewLayerSet::for_schematic(&themes.schematic);
            SchematicPainter::new(&themes.schematic)
                .paint(&mut renderer, &mut layers, sch)
                .map_err(|e| e.to_string())?;
        }
        KicadDocument::Board(pcb) => {
            let mut layers = ViewLayerSet::for_board(pcb, &themes.board);
            BoardPainter::new(&themes.board)
                .paint(&mut renderer, &mut layers, pcb)
                .map_err(|e| e.to_string())?;
        }
    }

    if format == DocumentFormat::Board {
        log::info!("painted board with {} layers", renderer.layers().len());
    }
    let bbox = renderer.bbox();
    Ok(Dump {
        layers: renderer.into_layers(),
        bbox,
    })
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(dump) => {
            let json = if cli.pretty {
                serde_json::to_string_pretty(&dump)
            } else {
                serde_json::to_string(&dump)
            }
            .expect("JSON serialization failed");

            if let Some(output_path) = &cli.output {
                std::fs::write(output_path, &json).expect("Failed to write output file");
                eprintln!("Written to {}", output_path.display());
            } else {
                println!("{json}");
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
