use std::fs;
use std::io::{self, Read};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use uuid::Uuid;
use vecscene::{ConfigError, EditorConfig, Element, Point, SceneError, SceneStore};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: String, source: io::Error },
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("--write needs a scene file, not stdin")]
    WriteToStdin,
    #[error("{command} changed nothing")]
    NoChange { command: &'static str },
}

#[derive(Parser, Debug)]
#[command(name = "vecscene", about = "Inspect and edit vector scene snapshots")]
struct Cli {
    /// Scene snapshot (a JSON array of element models), or - for stdin.
    #[arg(long, env = "VECSCENE_SCENE", default_value = "-")]
    scene: String,

    /// Write the edited scene back to the scene file instead of stdout.
    #[arg(long, default_value_t = false)]
    write: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize every element in draw order.
    Inspect,
    /// Append a new shape on top of the scene.
    Add(AddArgs),
    /// Remove elements and their descendants.
    Remove { ids: Vec<Uuid> },
    Translate {
        #[arg(long, allow_hyphen_values = true)]
        dx: f64,
        #[arg(long, allow_hyphen_values = true)]
        dy: f64,
        ids: Vec<Uuid>,
    },
    /// Set an element's rotation in degrees.
    Rotate {
        #[arg(long, allow_hyphen_values = true)]
        angle: f64,
        id: Uuid,
    },
    /// Set an element's width and/or height.
    Resize {
        #[arg(long)]
        width: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
        id: Uuid,
    },
    /// Set an element's Y shear in degrees.
    Lean {
        #[arg(long, allow_hyphen_values = true)]
        angle: f64,
        id: Uuid,
    },
    FlipX { ids: Vec<Uuid> },
    FlipY { ids: Vec<Uuid> },
    Group { ids: Vec<Uuid> },
    Ungroup { id: Uuid },
    /// Move elements one step up the draw order.
    Raise { ids: Vec<Uuid> },
    /// Move elements one step down the draw order.
    Lower { ids: Vec<Uuid> },
    Front { ids: Vec<Uuid> },
    Back { ids: Vec<Uuid> },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Inspect => "inspect",
            Self::Add(_) => "add",
            Self::Remove { .. } => "remove",
            Self::Translate { .. } => "translate",
            Self::Rotate { .. } => "rotate",
            Self::Resize { .. } => "resize",
            Self::Lean { .. } => "lean",
            Self::FlipX { .. } => "flip-x",
            Self::FlipY { .. } => "flip-y",
            Self::Group { .. } => "group",
            Self::Ungroup { .. } => "ungroup",
            Self::Raise { .. } => "raise",
            Self::Lower { .. } => "lower",
            Self::Front { .. } => "front",
            Self::Back { .. } => "back",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum AddKind {
    Rect,
    Ellipse,
    Line,
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(value_enum)]
    kind: AddKind,
    /// Center for boxes, start point for lines.
    #[arg(long, allow_hyphen_values = true)]
    x: f64,
    #[arg(long, allow_hyphen_values = true)]
    y: f64,
    /// Box width, or the line's x extent.
    #[arg(long, allow_hyphen_values = true, default_value_t = 100.0)]
    width: f64,
    /// Box height, or the line's y extent.
    #[arg(long, allow_hyphen_values = true, default_value_t = 100.0)]
    height: f64,
    #[arg(long, default_value = "")]
    name: String,
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let config = EditorConfig::from_env()?;
    let input = read_scene(&cli.scene)?;
    let mut store = if input.trim().is_empty() {
        SceneStore::new(config)
    } else {
        SceneStore::from_json(&input, config)?
    };

    if let Command::Inspect = cli.command {
        return print_json(&inspect(&store));
    }
    run(&mut store, cli.command)?;

    let output = store.to_json()?;
    if cli.write {
        if cli.scene == "-" {
            return Err(CliError::WriteToStdin);
        }
        fs::write(&cli.scene, output).map_err(|source| CliError::Write { path: cli.scene.clone(), source })?;
        tracing::info!(path = %cli.scene, elements = store.len(), "scene written");
    } else {
        println!("{output}");
    }
    Ok(())
}

fn run(store: &mut SceneStore, command: Command) -> Result<(), CliError> {
    let name = command.name();
    let changed = match command {
        Command::Inspect => Vec::new(),
        Command::Add(args) => {
            let id = store.add_element(build_element(&args))?;
            eprintln!("added: {id}");
            vec![id]
        }
        Command::Remove { ids } => ids.iter().flat_map(|id| store.remove_element(*id)).collect(),
        Command::Translate { dx, dy, ids } => store.translate(&ids, Point::new(dx, dy)),
        Command::Rotate { angle, id } => store.set_angle(id, angle, false),
        Command::Resize { width, height, id } => {
            let mut changed = Vec::new();
            if let Some(width) = width {
                changed.extend(store.set_width(id, width));
            }
            if let Some(height) = height {
                changed.extend(store.set_height(id, height));
            }
            changed
        }
        Command::Lean { angle, id } => store.set_lean(id, angle),
        Command::FlipX { ids } => store.flip_x(&ids),
        Command::FlipY { ids } => store.flip_y(&ids),
        Command::Group { ids } => match store.create_element_group(&ids) {
            Some(gid) => {
                eprintln!("group: {gid}");
                vec![gid]
            }
            None => Vec::new(),
        },
        Command::Ungroup { id } => store.remove_element_group(id).unwrap_or_default(),
        Command::Raise { ids } => store.shift_move(&ids),
        Command::Lower { ids } => store.go_down(&ids),
        Command::Front { ids } => store.bring_to_front(&ids),
        Command::Back { ids } => store.send_to_back(&ids),
    };
    if changed.is_empty() {
        return Err(CliError::NoChange { command: name });
    }
    tracing::debug!(count = changed.len(), "elements changed");
    Ok(())
}

fn build_element(args: &AddArgs) -> Element {
    let origin = Point::new(args.x, args.y);
    let element = match args.kind {
        AddKind::Rect => Element::rect(origin, args.width, args.height),
        AddKind::Ellipse => Element::ellipse(origin, args.width, args.height),
        AddKind::Line => Element::line(origin, origin + Point::new(args.width, args.height)),
    };
    element.with_name(args.name.clone())
}

fn inspect(store: &SceneStore) -> Value {
    let rows: Vec<Value> = store
        .elements()
        .map(|e| {
            json!({
                "id": e.id(),
                "kind": e.kind().name(),
                "name": e.name(),
                "center": [e.center().x, e.center().y],
                "width": e.width(),
                "height": e.height(),
                "angle": e.angle(),
                "lean": e.lean_y_angle(),
                "flipped": e.is_flipped_x(),
                "group": e.group_id(),
                "visible": e.is_visible(),
            })
        })
        .collect();
    Value::Array(rows)
}

fn read_scene(path: &str) -> Result<String, CliError> {
    let mut buf = String::new();
    if path == "-" {
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| CliError::Read { path: "stdin".to_owned(), source })?;
    } else {
        buf = fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_owned(), source })?;
    }
    Ok(buf)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
