// Volkeys End-to-End Test Scenarios
//
// These tests simulate complete user workflows — capture a chord, persist
// it, reload it, and dispatch against a live event stream — without
// requiring actual hardware.
//
// Run with: cargo test --test e2e_scenarios

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use volkeys_core::{
    parse_chord, Binding, BindingGroup, BindingStore, CaptureError, Collector, InputEvent,
    Listener, MatchEngine, MouseButton, RawKey, ScriptedSource,
};

// =========================================================================
// Test Helpers
// =========================================================================

fn press(name: &str) -> InputEvent {
    InputEvent::KeyPress(RawKey::named(name))
}

fn release(name: &str) -> InputEvent {
    InputEvent::KeyRelease(RawKey::named(name))
}

fn scroll(delta: i32) -> InputEvent {
    InputEvent::Scroll { delta }
}

fn button(button: MouseButton, pressed: bool) -> InputEvent {
    InputEvent::Button { button, pressed }
}

fn counter() -> (Arc<AtomicUsize>, impl FnMut() -> anyhow::Result<()>) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    (count, move || {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

/// Capture one binding from a scripted event stream.
fn capture(events: Vec<InputEvent>) -> Result<Binding, CaptureError> {
    Collector::new(ScriptedSource::new(events)).collect()
}

/// Run a full replay through a listener and return the engine afterwards.
fn listen(engine: MatchEngine, events: Vec<InputEvent>) -> MatchEngine {
    let mut listener = Listener::new(ScriptedSource::new(events), engine);
    listener.start().expect("listener start");
    listener.wait().expect("listener wait");
    let (_, engine) = listener.into_parts();
    engine.expect("engine returned after wait")
}

// =========================================================================
// Capture → persist → reload → dispatch
// =========================================================================

#[test]
fn captured_chord_survives_persistence_and_fires() {
    let tmp = tempfile::tempdir().unwrap();
    let store = BindingStore::at(tmp.path());

    // user holds ctrl+shift and hits G
    let binding = capture(vec![
        press("LEFT_CTRL"),
        press("LEFT_SHIFT"),
        InputEvent::KeyPress(RawKey::of_char('g')),
    ])
    .unwrap();
    assert_eq!(binding.describe(), "LEFT_CTRL + LEFT_SHIFT + G");

    let group = BindingGroup::with_bindings("volume_up", vec![binding]);
    store.save(&group).unwrap();

    let reloaded = store.load("volume_up").unwrap().unwrap();
    assert_eq!(reloaded, group);

    let mut engine = MatchEngine::new();
    let (count, action) = counter();
    engine.register(reloaded, action);

    let engine = listen(
        engine,
        vec![
            press("LEFT_CTRL"),
            press("LEFT_SHIFT"),
            press("G"),
            press("G"), // key repeat must not re-fire
            release("G"),
            release("LEFT_SHIFT"),
            release("LEFT_CTRL"),
        ],
    );
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(engine.pressed().is_empty());
}

#[test]
fn captured_scroll_chord_round_trips() {
    let tmp = tempfile::tempdir().unwrap();
    let store = BindingStore::at(tmp.path());

    let binding = capture(vec![
        press("LEFT_CTRL"),
        press("LEFT_SHIFT"),
        scroll(1),
    ])
    .unwrap();
    assert_eq!(binding.describe(), "LEFT_CTRL + LEFT_SHIFT + <ScrollUp>");

    store
        .save(&BindingGroup::with_bindings("volume_up", vec![binding]))
        .unwrap();
    let group = store.load("volume_up").unwrap().unwrap();

    let mut engine = MatchEngine::new();
    let (count, action) = counter();
    engine.register(group, action);

    let engine = listen(
        engine,
        vec![
            press("LEFT_CTRL"),
            press("LEFT_SHIFT"),
            scroll(2),
            scroll(3),
            release("LEFT_SHIFT"),
            scroll(1), // chord broken, must not fire
        ],
    );
    // each qualifying pulse fires once
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(engine.pressed().len(), 1);
}

#[test]
fn captured_button_chord_dispatches() {
    let binding = capture(vec![
        press("LEFT_CTRL"),
        button(MouseButton::Left, true), // ordinary press ignored mid-capture
        button(MouseButton::Middle, true),
    ])
    .unwrap();
    assert_eq!(binding.describe(), "LEFT_CTRL + MouseMiddle");

    let mut engine = MatchEngine::new();
    let (count, action) = counter();
    engine.register(BindingGroup::with_bindings("mute", vec![binding]), action);

    let engine = listen(
        engine,
        vec![
            press("LEFT_CTRL"),
            button(MouseButton::Middle, true),
            button(MouseButton::Middle, false),
            button(MouseButton::Middle, true),
        ],
    );
    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(engine.pressed().len(), 2);
}

// =========================================================================
// Defaults and fallback
// =========================================================================

#[test]
fn missing_resource_falls_back_to_parsed_default() {
    let tmp = tempfile::tempdir().unwrap();
    let store = BindingStore::at(tmp.path());

    let default = BindingGroup::with_bindings(
        "volume_down",
        vec![parse_chord("Ctrl+Shift+ScrollDown").unwrap()],
    );
    let group = store.load_or("volume_down", default.clone());
    assert_eq!(group, default);

    let mut engine = MatchEngine::new();
    let (count, action) = counter();
    engine.register(group, action);

    let engine = listen(
        engine,
        vec![press("LEFT_CTRL"), press("LEFT_SHIFT"), scroll(-1)],
    );
    assert_eq!(count.load(Ordering::SeqCst), 1);
    drop(engine);
}

#[test]
fn corrupt_resource_quarantines_and_default_still_works() {
    let tmp = tempfile::tempdir().unwrap();
    let store = BindingStore::at(tmp.path());
    std::fs::create_dir_all(store.dir()).unwrap();
    std::fs::write(store.path_for("volume_up"), "not a binding file\n").unwrap();

    let default = BindingGroup::with_bindings(
        "volume_up",
        vec![parse_chord("Ctrl+Shift+ScrollUp").unwrap()],
    );
    let group = store.load_or("volume_up", default.clone());
    assert_eq!(group, default);
    assert!(tmp.path().join("volume_up.kbd.invalid").exists());

    // the quarantined file is out of the way: a fresh save works
    store.save(&group).unwrap();
    assert_eq!(store.load("volume_up").unwrap().unwrap(), default);
}

#[test]
fn partially_corrupt_file_keeps_surviving_bindings() {
    let tmp = tempfile::tempdir().unwrap();
    let store = BindingStore::at(tmp.path());
    std::fs::create_dir_all(store.dir()).unwrap();
    std::fs::write(
        store.path_for("volume_up"),
        "modifiers\n29:LEFT_CTRL\nwheel\n<ScrollUp>\n\nmodifiers\n29:LEFT_CTRL\n42:LEFT_SHIFT\nscroll\n<ScrollUp>\n",
    )
    .unwrap();

    let group = store.load("volume_up").unwrap().unwrap();
    assert_eq!(group.len(), 1);
    assert_eq!(
        group.bindings()[0].describe(),
        "LEFT_CTRL + LEFT_SHIFT + <ScrollUp>"
    );
}

// =========================================================================
// Multiple groups, precedence, reconfiguration
// =========================================================================

#[test]
fn first_registered_group_wins_the_evaluation() {
    let mut engine = MatchEngine::new();
    let (first, action_a) = counter();
    let (second, action_b) = counter();

    let chord = parse_chord("Ctrl+G").unwrap();
    engine.register(
        BindingGroup::with_bindings("first", vec![chord.clone()]),
        action_a,
    );
    engine.register(BindingGroup::with_bindings("second", vec![chord]), action_b);

    let _ = listen(engine, vec![press("LEFT_CTRL"), press("G")]);
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
}

#[test]
fn stop_mutate_restart_rebinds_cleanly() {
    let tmp = tempfile::tempdir().unwrap();
    let store = BindingStore::at(tmp.path());

    let mut engine = MatchEngine::new();
    let (count, action) = counter();
    engine.register(
        BindingGroup::with_bindings("volume_up", vec![parse_chord("Ctrl+G").unwrap()]),
        action,
    );

    let source = ScriptedSource::new(vec![press("LEFT_CTRL"), press("G")]);
    let mut listener = Listener::new(source, engine);
    listener.start().unwrap();
    listener.wait().unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // reconfigure while stopped: user rebinds volume_up to Ctrl+H
    let rebound = BindingGroup::with_bindings("volume_up", vec![parse_chord("Ctrl+H").unwrap()]);
    store.save(&rebound).unwrap();
    let engine = listener.engine_mut().expect("engine available while stopped");
    let (count2, action2) = counter();
    engine.unregister("volume_up");
    engine.register(store.load("volume_up").unwrap().unwrap(), action2);

    let (_, engine) = listener.into_parts();
    let engine = listen(
        engine.unwrap(),
        vec![
            press("LEFT_CTRL"),
            press("G"), // old chord, must be dead
            release("G"),
            press("H"),
        ],
    );
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(count2.load(Ordering::SeqCst), 1);
    drop(engine);
}

// =========================================================================
// Anomaly recovery
// =========================================================================

#[test]
fn lost_press_event_degrades_to_no_fire() {
    let mut engine = MatchEngine::new();
    let (count, action) = counter();
    engine.register(
        BindingGroup::with_bindings("volume_up", vec![parse_chord("Ctrl+Shift+G").unwrap()]),
        action,
    );

    let engine = listen(
        engine,
        vec![
            press("LEFT_CTRL"),
            release("LEFT_SHIFT"), // never pressed: defensive clear
            press("LEFT_SHIFT"),
            press("G"), // ctrl was cleared, chord incomplete
        ],
    );
    assert_eq!(count.load(Ordering::SeqCst), 0);
    drop(engine);
}

#[test]
fn failing_action_does_not_poison_later_chords() {
    let mut engine = MatchEngine::new();
    engine.register(
        BindingGroup::with_bindings("broken", vec![parse_chord("Ctrl+G").unwrap()]),
        || anyhow::bail!("mixer went away"),
    );
    let (count, action) = counter();
    engine.register(
        BindingGroup::with_bindings("volume_up", vec![parse_chord("Ctrl+H").unwrap()]),
        action,
    );

    let _ = listen(
        engine,
        vec![
            press("LEFT_CTRL"),
            press("G"),
            release("G"),
            press("H"),
        ],
    );
    assert_eq!(count.load(Ordering::SeqCst), 1);
}
