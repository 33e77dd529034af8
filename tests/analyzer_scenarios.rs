use spectrum_analyzer_core::{
    Analyzer, ChannelMode, Configuration, GridRole, SmoothingMode, ViewKind,
};
use std::f32::consts::PI;

const SAMPLE_RATE: u32 = 44_100;
const COLUMNS: usize = 400;

fn collect_pass(analyzer: &Analyzer, pass: usize) -> Vec<(usize, f32)> {
    (0..COLUMNS)
        .filter_map(|column| {
            let value = analyzer.next_display_column(pass, column, COLUMNS)?.value?;
            Some((column, value))
        })
        .collect()
}

#[test]
fn bin_aligned_sine_peaks_in_its_bucket() {
    let (mut analyzer, ingest) = Analyzer::with_config(
        SAMPLE_RATE,
        Configuration {
            resolution_level: 3,
            channel_mode: ChannelMode::Left,
            smoothing_mode: SmoothingMode::Off,
            ..Configuration::default()
        },
    );
    assert_eq!(analyzer.transform_size(), 1024);

    let bin = 40;
    for n in 0..2048 {
        let x = (2.0 * PI * bin as f32 * n as f32 / 1024.0).sin();
        ingest.push_sample(x, x);
    }
    assert!(analyzer.advance(COLUMNS));

    let values = collect_pass(&analyzer, 0);
    let (peak_column, _) = values
        .iter()
        .copied()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap();
    assert_eq!(analyzer.column_bin(peak_column, COLUMNS), Some(bin));
}

#[test]
fn interleaved_host_buffers_feed_the_transform() {
    let (mut analyzer, ingest) = Analyzer::with_config(
        SAMPLE_RATE,
        Configuration {
            smoothing_mode: SmoothingMode::Off,
            ..Configuration::default()
        },
    );

    let frames: Vec<i16> = (0..2048)
        .flat_map(|n| {
            let x = (2.0 * PI * 64.0 * n as f32 / 1024.0).sin();
            let sample = (x * i16::MAX as f32 * 0.5) as i16;
            [sample, sample]
        })
        .collect();
    ingest.push_interleaved(frames.as_slice());
    assert!(analyzer.advance(COLUMNS));

    let (left, _) = analyzer.channels();
    assert!(left.raw()[64] > left.raw()[20] * 10.0);
}

#[test]
fn image_mode_mirrors_right_channel_below_centre() {
    let (mut analyzer, ingest) = Analyzer::with_config(
        SAMPLE_RATE,
        Configuration {
            channel_mode: ChannelMode::Image,
            smoothing_mode: SmoothingMode::Off,
            level_gain: 2.0,
            ..Configuration::default()
        },
    );
    for n in 0..2048 {
        let t = n as f32 / SAMPLE_RATE as f32;
        ingest.push_sample((2.0 * PI * 1000.0 * t).sin(), 0.5 * (2.0 * PI * 3000.0 * t).sin());
    }
    analyzer.advance(COLUMNS);

    let upper = collect_pass(&analyzer, 0);
    let lower = collect_pass(&analyzer, 1);
    assert!(upper.iter().all(|(_, v)| *v >= 0.0));
    assert!(lower.iter().all(|(_, v)| *v <= 0.0));
    assert!(upper.iter().any(|(_, v)| *v > 0.0));
    assert!(lower.iter().any(|(_, v)| *v < 0.0));
    assert!(analyzer.next_display_column(2, 0, COLUMNS).is_none());
}

#[test]
fn frozen_display_ignores_new_audio() {
    let (mut analyzer, ingest) = Analyzer::with_config(
        SAMPLE_RATE,
        Configuration {
            sweep_speed: 15,
            view_kind: ViewKind::Bars,
            ..Configuration::default()
        },
    );
    for n in 0..4096 {
        let x = (n as f32 * 0.05).sin();
        ingest.push_sample(x, x);
    }
    analyzer.advance(COLUMNS);
    let before = collect_pass(&analyzer, 0);

    analyzer.configure(Configuration {
        freeze_enabled: true,
        ..*analyzer.config()
    });
    for round in 0..3 {
        for n in 0..4096 {
            let x = 0.2 * (n as f32 * (0.3 + round as f32 * 0.1)).cos();
            ingest.push_sample(x, -x);
        }
        analyzer.advance(COLUMNS);
        assert_eq!(collect_pass(&analyzer, 0), before);
    }
}

#[test]
fn image_grid_has_a_single_centre_line() {
    let (mut analyzer, _ingest) = Analyzer::with_config(
        SAMPLE_RATE,
        Configuration {
            channel_mode: ChannelMode::Image,
            ..Configuration::default()
        },
    );
    assert!(analyzer.should_redraw_grid(0));

    let mut lines = Vec::new();
    let mut index = 0;
    while let Some(line) = analyzer.next_gridline(index) {
        lines.push(line);
        index += 1;
    }
    assert_eq!(
        lines.iter().filter(|l| l.role == GridRole::Center).count(),
        1
    );
    assert!(analyzer.next_gridline(index + 1).is_none());
    assert!(analyzer.next_gridline(index + 2).is_none());

    // a fresh grid pass starts over
    assert!(analyzer.next_gridline(0).is_some());
}
