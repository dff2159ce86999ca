// Volkeys CLI
// Capture, inspect and exercise binding groups from replayed event scripts

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;

use volkeys_core::{
    codec, parse_chord, BindingGroup, BindingStore, Collector, InputEvent, Listener, MatchEngine,
    MouseButton, RawKey, ScriptedSource, Settings,
};

/// Keybind capture and matching engine tester.
///
/// Event scripts are plain text, one event per line:
///
///   press LEFT_CTRL
///   press g
///   release g
///   button middle press
///   scroll up
///
/// Lines starting with '#' and blank lines are ignored.
#[derive(Parser, Debug)]
#[command(name = "volkeys")]
#[command(version)]
#[command(about = "Keybind capture and matching engine", long_about = None)]
struct Args {
    /// Settings file (default: <config>/volkeys/settings.toml)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the binding store directory
    #[arg(long, value_name = "DIR")]
    store: Option<PathBuf>,

    /// Event script to replay as the input source
    #[arg(short, long, value_name = "SCRIPT")]
    replay: Option<PathBuf>,

    /// Capture a binding for GROUP from the replayed events and save it
    #[arg(long, value_name = "GROUP")]
    capture: Option<String>,

    /// Add the captured binding to GROUP instead of replacing it
    #[arg(long, requires = "capture")]
    append: bool,

    /// Print the stored bindings for GROUP
    #[arg(long, value_name = "GROUP")]
    show: Option<String>,

    /// Validate the stored resource for GROUP without touching it
    #[arg(long, value_name = "GROUP")]
    check: Option<String>,

    /// Replay events against the configured groups and print activations
    #[arg(short, long)]
    listen: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    let settings = match &args.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::load_default().context("loading default settings")?,
    };

    let store = match args.store.as_deref().or(settings.store_dir()) {
        Some(dir) => BindingStore::at(dir),
        None => BindingStore::open_default().context("resolving binding store directory")?,
    };

    if let Some(name) = &args.capture {
        return capture_group(&args, &store, name);
    }
    if let Some(name) = &args.show {
        return show_group(&store, name);
    }
    if let Some(name) = &args.check {
        return check_group(&store, name);
    }
    if args.listen {
        return listen(&args, &settings, &store);
    }

    bail!("nothing to do; try --capture, --show, --check or --listen (see --help)");
}

fn capture_group(args: &Args, store: &BindingStore, name: &str) -> anyhow::Result<()> {
    let source = replay_source(args)?;
    let mut collector = Collector::new(source);
    let binding = collector.collect().context("capturing binding")?;
    println!("captured: {binding}");

    let mut group = if args.append {
        store
            .load_or(name, BindingGroup::new(name))
    } else {
        BindingGroup::new(name)
    };
    group.add_binding(binding);
    store.save(&group).context("saving binding group")?;
    println!(
        "saved {} binding(s) for '{}' to {}",
        group.len(),
        name,
        store.path_for(name).display()
    );
    Ok(())
}

fn show_group(store: &BindingStore, name: &str) -> anyhow::Result<()> {
    match store.load(name)? {
        Some(group) => {
            println!("{name}: {} binding(s)", group.len());
            for (index, binding) in group.bindings().iter().enumerate() {
                println!("  [{index}] {binding}");
            }
        }
        None => println!("{name}: no stored bindings"),
    }
    Ok(())
}

/// Validate without the store's quarantine side effects.
fn check_group(store: &BindingStore, name: &str) -> anyhow::Result<()> {
    let path = store.path_for(name);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    match codec::decode_group(name, &text) {
        Ok(decoded) => {
            println!(
                "{}: OK, {} binding(s), {} rejected block(s)",
                path.display(),
                decoded.group.len(),
                decoded.rejected.len()
            );
            for rejection in &decoded.rejected {
                println!("  rejected: {rejection}");
            }
            Ok(())
        }
        Err(err) => bail!("{}: corrupt: {}", path.display(), err),
    }
}

fn listen(args: &Args, settings: &Settings, store: &BindingStore) -> anyhow::Result<()> {
    let mut engine = MatchEngine::new();
    let mut registered = 0usize;
    for (name, chord) in settings.defaults() {
        let default = parse_chord(chord)
            .with_context(|| format!("default chord for '{name}' ('{chord}')"))?;
        let group = store.load_or(name, BindingGroup::with_bindings(name, vec![default]));
        for binding in group.bindings() {
            log::info!("{name}: {binding}");
        }
        let label = name.to_string();
        engine.register(group, move || {
            println!("{label} activated");
            Ok(())
        });
        registered += 1;
    }
    if registered == 0 {
        bail!("no groups configured; add a [defaults] section to the settings file");
    }

    let source = replay_source(args)?;
    let mut listener = Listener::new(source, engine);
    listener.start().context("starting listener")?;

    let interrupted = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&interrupted))
        .context("registering SIGINT handler")?;

    while !listener.is_finished() && !interrupted.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(25));
    }
    if interrupted.load(Ordering::Relaxed) {
        log::info!("interrupted, stopping listener");
    }
    listener.stop().context("stopping listener")?;
    Ok(())
}

fn replay_source(args: &Args) -> anyhow::Result<ScriptedSource> {
    let Some(path) = &args.replay else {
        bail!(
            "this build drives the engine from replayed event scripts; \
             pass one with --replay (OS input hooks live in the host application)"
        );
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading event script {}", path.display()))?;
    Ok(ScriptedSource::new(parse_script(&text)?))
}

/// Parse an event script: `press`/`release` with a key name or single
/// character, `button <name> press|release`, `scroll up|down`.
fn parse_script(text: &str) -> anyhow::Result<Vec<InputEvent>> {
    let mut events = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let event = match verb {
            "press" | "release" => {
                let key = words
                    .next()
                    .with_context(|| format!("line {}: missing key name", lineno + 1))?;
                let raw = raw_key(key);
                if verb == "press" {
                    InputEvent::KeyPress(raw)
                } else {
                    InputEvent::KeyRelease(raw)
                }
            }
            "button" => {
                let label = words
                    .next()
                    .with_context(|| format!("line {}: missing button name", lineno + 1))?;
                let button = MouseButton::from_label(label)
                    .with_context(|| format!("line {}: unknown button '{label}'", lineno + 1))?;
                let pressed = match words.next() {
                    Some("press") | None => true,
                    Some("release") => false,
                    Some(other) => {
                        bail!("line {}: expected press/release, got '{other}'", lineno + 1)
                    }
                };
                InputEvent::Button { button, pressed }
            }
            "scroll" => match words.next() {
                Some("up") => InputEvent::Scroll { delta: 1 },
                Some("down") => InputEvent::Scroll { delta: -1 },
                other => bail!(
                    "line {}: expected up/down, got '{}'",
                    lineno + 1,
                    other.unwrap_or("")
                ),
            },
            other => bail!("line {}: unknown event '{other}'", lineno + 1),
        };
        if words.next().is_some() {
            bail!("line {}: trailing tokens", lineno + 1);
        }
        events.push(event);
    }
    Ok(events)
}

/// A single lowercase character is a printable key; anything longer is a
/// symbolic name.
fn raw_key(token: &str) -> RawKey {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_ascii_uppercase() => RawKey::of_char(c),
        _ => RawKey::named(token),
    }
}
