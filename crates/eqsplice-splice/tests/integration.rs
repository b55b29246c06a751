//! Integration tests for eqsplice-splice.
//!
//! Plays page-built graphs through the in-memory host and compares what
//! reaches the destination with the same input played through one engine
//! wired by hand. A leftover unfiltered path, or a second engine in series,
//! shows up as a mismatch.

use std::f32::consts::TAU;
use std::time::Duration;

use eqsplice_config::{
    ChannelMessage, EngineConfig, PersistedSettings, RetryPolicy, Settings, SettingsMessage,
    get_factory_preset,
};
use eqsplice_core::{
    AudioGraph, ContextId, ElementId, EqualizerEngine, GraphError, MemoryGraph, ReadyState,
    db_to_linear,
};
use eqsplice_splice::{MediaElementWatcher, SettingsChannel, SpliceOutcome, SplicingGraph};

const SAMPLE_RATE: f32 = 48000.0;
const FRAMES: usize = 4800;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn graph() -> SplicingGraph<MemoryGraph> {
    init_tracing();
    SplicingGraph::new(MemoryGraph::new(SAMPLE_RATE))
}

/// A short two-tone burst.
fn program(level: f32) -> Vec<f32> {
    (0..FRAMES)
        .map(|n| {
            let t = n as f32 / SAMPLE_RATE;
            level * (0.6 * (TAU * 64.0 * t).sin() + 0.4 * (TAU * 4000.0 * t).sin())
        })
        .collect()
}

fn render(graph: &mut SplicingGraph<MemoryGraph>, ctx: ContextId) -> Vec<f32> {
    graph.inner_mut().render(ctx, FRAMES).unwrap()
}

/// What `input` sounds like through one engine wired by hand.
fn reference(input: Vec<f32>, settings: &Settings) -> Vec<f32> {
    let mut host = MemoryGraph::new(SAMPLE_RATE);
    let ctx = host.create_context();
    let mut eq = EqualizerEngine::new(&mut host, ctx).unwrap();
    eq.set_enabled(&mut host, settings.enabled).unwrap();
    for (i, &gain) in settings.gains.iter().enumerate() {
        eq.set_band_gain(&mut host, i, gain).unwrap();
    }
    let src = host.create_buffer_source(ctx, input).unwrap();
    let dest = host.destination(ctx).unwrap();
    host.connect(src, eq.input()).unwrap();
    host.connect(eq.output(), dest).unwrap();
    host.render(ctx, FRAMES).unwrap()
}

fn preset(id: &str) -> Settings {
    get_factory_preset(id).unwrap().settings(true)
}

fn preset_message(id: &str) -> SettingsMessage {
    preset(id).to_message(Some(id))
}

fn assert_same_signal(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    let worst = actual
        .iter()
        .zip(expected)
        .map(|(a, e)| (a - e).abs())
        .fold(0.0_f32, f32::max);
    assert!(worst < 1e-6, "signals differ by up to {worst}");
}

// ============================================================================
// 1. Generic destination connects
// ============================================================================

#[test]
fn page_source_is_filtered_exactly_once() {
    let mut graph = graph();
    let mut channel = SettingsChannel::new();

    let ctx = graph.create_context();
    let src = graph.create_buffer_source(ctx, program(0.5)).unwrap();
    let dest = graph.destination(ctx).unwrap();
    assert_eq!(graph.connect(src, dest).unwrap(), dest);

    channel.post(preset_message("bass"));
    assert_eq!(channel.deliver(&mut graph), 1);

    let master = graph.engine(ctx).unwrap().master_gain();
    assert!((master - db_to_linear(-3.78)).abs() < 1e-4);
    assert_same_signal(&render(&mut graph, ctx), &reference(program(0.5), &preset("bass")));
}

#[test]
fn repeated_connects_share_one_engine() {
    let mut graph = graph();
    let ctx = graph.create_context();
    let dest = graph.destination(ctx).unwrap();
    let a = graph.create_buffer_source(ctx, program(0.25)).unwrap();
    let b = graph.create_buffer_source(ctx, program(0.25)).unwrap();

    for _ in 0..3 {
        graph.connect(a, dest).unwrap();
        graph.connect(b, dest).unwrap();
    }

    assert_eq!(graph.registry().created(), 1);
    let input = graph.engine(ctx).unwrap().input();
    assert_eq!(graph.inner().outgoing(a), &[input]);
    assert_eq!(graph.inner().outgoing(b), &[input]);
    assert_eq!(graph.inner().incoming_count(dest), 1);

    // Both sources mix into the first band; nothing bypasses the engine.
    assert_same_signal(
        &render(&mut graph, ctx),
        &reference(program(0.5), &Settings::default()),
    );
}

#[test]
fn page_effect_chain_is_kept_in_front_of_equalizer() {
    let mut graph = graph();
    let ctx = graph.create_context();
    let dest = graph.destination(ctx).unwrap();
    let src = graph.create_buffer_source(ctx, program(0.5)).unwrap();
    let volume = graph.create_gain(ctx, 0.5).unwrap();

    graph.connect(src, volume).unwrap();
    graph.connect(volume, dest).unwrap();
    assert!(!graph.is_routed(src));
    assert!(graph.is_routed(volume));

    graph.apply_settings(&preset("perfect"));
    assert!((graph.engine(ctx).unwrap().compensation_db() + 8.5).abs() < 1e-4);
    assert_same_signal(&render(&mut graph, ctx), &reference(program(0.25), &preset("perfect")));
}

// ============================================================================
// 2. Element attachment
// ============================================================================

#[test]
fn page_attached_element_is_filtered_once() {
    let mut graph = graph();
    let el = graph.inner_mut().add_element(program(0.5));
    graph.apply_settings(&preset("bass"));

    let ctx = graph.create_context();
    let src = graph.create_element_source(ctx, el).unwrap();
    assert!(graph.is_wired(ctx));

    // The page then connects as usual.
    let dest = graph.destination(ctx).unwrap();
    assert_eq!(graph.connect(src, dest).unwrap(), dest);
    assert_eq!(graph.inner().incoming_count(dest), 1);

    assert_same_signal(&render(&mut graph, ctx), &reference(program(0.5), &preset("bass")));
}

#[test]
fn page_attach_after_watcher_falls_back_to_capture() {
    let mut graph = graph();
    let el = graph.inner_mut().add_element(program(0.5));

    let watched = graph.splice_element(el);
    let SpliceOutcome::Direct(ours) = watched else {
        panic!("expected direct attachment, got {watched:?}");
    };

    let page_ctx = graph.create_context();
    let src = graph.create_element_source(page_ctx, el).unwrap();
    assert_ne!(page_ctx, ours);
    assert!(graph.is_routed(src));
    assert_eq!(graph.registry().len(), 2);

    graph.apply_settings(&preset("bass"));
    assert_same_signal(
        &render(&mut graph, page_ctx),
        &reference(program(0.5), &preset("bass")),
    );
}

#[test]
fn element_without_capture_surfaces_attach_error() {
    let mut graph = graph();
    let el = graph.inner_mut().add_element(program(0.5));
    graph.inner_mut().set_capture_supported(el, false).unwrap();
    assert!(graph.splice_element(el).is_spliced());

    let page_ctx = graph.create_context();
    let err = graph.create_element_source(page_ctx, el).unwrap_err();
    assert_eq!(err, GraphError::AlreadyAttached(el));
    assert!(graph.engine(page_ctx).is_none());
}

// ============================================================================
// 3. Context lifecycle and settings broadcast
// ============================================================================

#[test]
fn closing_one_context_leaves_others_running() {
    let mut graph = graph();
    let mut contexts = Vec::new();
    for _ in 0..3 {
        let ctx = graph.create_context();
        let src = graph.create_buffer_source(ctx, program(0.5)).unwrap();
        let dest = graph.destination(ctx).unwrap();
        graph.connect(src, dest).unwrap();
        contexts.push(ctx);
    }
    assert_eq!(graph.registry().len(), 3);

    graph.close_context(contexts[1]).unwrap();
    assert_eq!(graph.registry().len(), 2);
    assert!(graph.engine(contexts[1]).is_none());

    let updated = graph.apply_settings(&preset("bass"));
    assert_eq!(updated, 2);
    assert_same_signal(
        &render(&mut graph, contexts[2]),
        &reference(program(0.5), &preset("bass")),
    );
}

#[test]
fn json_settings_reach_every_engine_and_late_ones() {
    let mut graph = graph();
    let mut channel = SettingsChannel::new();

    let first = graph.create_context();
    let src = graph.create_buffer_source(first, program(0.5)).unwrap();
    let dest = graph.destination(first).unwrap();
    graph.connect(src, dest).unwrap();

    let json = ChannelMessage::settings_changed(preset_message("rock"))
        .to_json()
        .unwrap();
    channel.post_json(&json).unwrap();
    channel.deliver(&mut graph);

    // An engine created after the broadcast starts from the same state.
    let el = graph.inner_mut().add_element(program(0.5));
    let late = graph.splice_element(el).context().unwrap();

    for ctx in [first, late] {
        let engine = graph.engine(ctx).unwrap();
        assert!(engine.is_enabled());
        assert_eq!(engine.band_gain(0), 4.0);
        assert_eq!(engine.band_gain(5), -1.0);
    }
}

#[test]
fn toggle_only_message_flattens_gains() {
    let mut graph = graph();
    let mut channel = SettingsChannel::new();
    let ctx = graph.create_context();
    let src = graph.create_buffer_source(ctx, program(0.5)).unwrap();
    let dest = graph.destination(ctx).unwrap();
    graph.connect(src, dest).unwrap();

    channel.post(preset_message("treble"));
    channel.post(SettingsMessage::enabled(true));
    channel.deliver(&mut graph);

    let engine = graph.engine(ctx).unwrap();
    assert!(engine.is_enabled());
    assert!((0..10).all(|i| engine.band_gain(i) == 0.0));
    assert_same_signal(
        &render(&mut graph, ctx),
        &reference(program(0.5), &Settings::new([0.0; 10], true)),
    );
}

#[test]
fn persisted_record_drives_startup_state() {
    let mut graph = graph();
    let mut record = PersistedSettings::first_run();
    record.apply_preset("vocal").unwrap();
    record.equalizer_enabled = true;

    let mut channel = SettingsChannel::new();
    channel.post_record(&record);
    channel.deliver(&mut graph);

    let el = graph.inner_mut().add_element(program(0.5));
    let ctx = graph.splice_element(el).context().unwrap();
    let engine = graph.engine(ctx).unwrap();
    assert_eq!(engine.band_gain(6), 5.0);
}

// ============================================================================
// 4. Watcher timeline
// ============================================================================

/// Runs the watcher until it has nothing left to do.
fn run_to_idle(
    graph: &mut SplicingGraph<MemoryGraph>,
    watcher: &mut MediaElementWatcher,
    mut on_tick: impl FnMut(&mut SplicingGraph<MemoryGraph>, Duration),
) -> Vec<(Duration, ElementId, SpliceOutcome)> {
    let mut log = Vec::new();
    while let Some(now) = watcher.next_deadline() {
        on_tick(graph, now);
        for (element, outcome) in watcher.tick(graph, now) {
            log.push((now, element, outcome));
        }
    }
    log
}

#[test]
fn watcher_picks_up_elements_at_each_scan() {
    let mut graph = graph();
    let mut watcher = MediaElementWatcher::new(&EngineConfig::default());
    let early = graph.inner_mut().add_element(program(0.5));

    let log = run_to_idle(&mut graph, &mut watcher, |graph, now| {
        // A second element shows up after the first scan.
        if now == Duration::from_millis(2000) && graph.media_elements().len() == 1 {
            graph.inner_mut().add_element(program(0.5));
        }
    });

    let spliced: Vec<_> = log
        .iter()
        .filter(|(_, _, outcome)| outcome.is_spliced())
        .map(|(at, el, _)| (at.as_millis(), *el))
        .collect();
    assert_eq!(spliced.len(), 2);
    assert_eq!(spliced[0], (500, early));
    assert_eq!(spliced[1].0, 2000);
    assert_eq!(graph.registry().created(), 2);
}

#[test]
fn slow_element_is_spliced_once_ready() {
    let mut graph = graph();
    let mut watcher = MediaElementWatcher::new(&EngineConfig::default());
    let el = graph.inner_mut().add_element(program(0.5));
    graph.inner_mut().set_ready_state(el, ReadyState::HaveNothing).unwrap();

    let log = run_to_idle(&mut graph, &mut watcher, |graph, now| {
        if now >= Duration::from_millis(1700) {
            graph
                .inner_mut()
                .set_ready_state(el, ReadyState::HaveCurrentData)
                .unwrap();
        }
    });

    // First seen at 500, then 1500 (load timeout), 1600, 1800.
    let attempts: Vec<u128> = log
        .iter()
        .filter(|(_, e, _)| *e == el)
        .map(|(at, _, _)| at.as_millis())
        .collect();
    assert_eq!(attempts, [500, 1500, 1600, 1800]);
    assert!(log.last().unwrap().2.is_spliced());
    assert_eq!(graph.registry().created(), 1);
}

#[test]
fn never_ready_element_is_retried_per_policy() {
    let mut graph = graph();
    let config = EngineConfig {
        scan_delays_ms: vec![0],
        retry: RetryPolicy {
            max_attempts: 4,
            ..RetryPolicy::default()
        },
        ..EngineConfig::default()
    };
    let mut watcher = MediaElementWatcher::new(&config);
    let el = graph.inner_mut().add_element(program(0.5));
    graph.inner_mut().set_ready_state(el, ReadyState::HaveMetadata).unwrap();

    let log = run_to_idle(&mut graph, &mut watcher, |_, _| {});
    let times: Vec<u128> = log.iter().map(|(at, _, _)| at.as_millis()).collect();
    assert_eq!(times, [0, 1000, 1100, 1300, 1700]);
    assert!(log.iter().all(|(_, _, o)| matches!(o, SpliceOutcome::NotReady)));
    assert!(graph.registry().is_empty());
    assert!(!graph.processed().elements.contains(el));
}

#[test]
fn loaded_data_and_timeout_race_splices_once() {
    let mut graph = graph();
    let mut watcher = MediaElementWatcher::new(&EngineConfig::default());
    let el = graph.inner_mut().add_element(program(0.5));
    graph.inner_mut().set_ready_state(el, ReadyState::HaveNothing).unwrap();

    watcher.tick(&mut graph, Duration::from_millis(500));
    graph
        .inner_mut()
        .set_ready_state(el, ReadyState::HaveEnoughData)
        .unwrap();

    let now = Duration::from_millis(1500);
    assert!(watcher.on_loaded_data(&mut graph, el, now).is_spliced());
    assert!(watcher.tick(&mut graph, now).is_empty());
    assert!(matches!(
        watcher.on_loaded_data(&mut graph, el, now),
        SpliceOutcome::AlreadyProcessed
    ));
    assert_eq!(graph.registry().created(), 1);
}
