//! Plain-text rendering of catalogs and comparison state for the terminal.

use std::io::{self, Write};

use catalog::{AlgorithmRegistry, SampleCatalog};
use foundation::SlotId;
use runtime::{Event, Severity};
use session::Session;

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}%"),
        None => "n/a".to_string(),
    }
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Debug => "debug",
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
    }
}

pub fn write_samples(out: &mut impl Write, samples: &SampleCatalog) -> io::Result<()> {
    for country in samples.countries() {
        writeln!(
            out,
            "{:<12} {:<20} {}",
            country.id, country.name, country.continent
        )?;
    }
    Ok(())
}

pub fn write_algorithms(out: &mut impl Write, registry: &AlgorithmRegistry) -> io::Result<()> {
    for info in registry.all() {
        let note = if info.available { "" } else { " (unavailable)" };
        writeln!(out, "{:<44} {}{note}", info.id, info.label)?;
    }
    Ok(())
}

pub fn write_notifications(out: &mut impl Write, events: &[Event]) -> io::Result<()> {
    for event in events.iter().filter(|e| e.severity.is_user_visible()) {
        writeln!(out, "[{}] {}", severity_tag(event.severity), event.message)?;
    }
    Ok(())
}

pub fn write_comparison(out: &mut impl Write, session: &Session) -> io::Result<()> {
    let Some(dataset) = session.dataset() else {
        return writeln!(out, "no dataset loaded");
    };
    writeln!(
        out,
        "dataset: {} ({} features, {} vertices)",
        dataset.source(),
        dataset.collection().len(),
        dataset.vertex_count()
    )?;
    if let Some(b) = dataset.bounds() {
        writeln!(
            out,
            "bounds: [{:.4}, {:.4}] .. [{:.4}, {:.4}]",
            b.min[0], b.min[1], b.max[0], b.max[1]
        )?;
    }
    if dataset.attributes_missing() {
        writeln!(out, "attributes: missing")?;
    }

    let cache = session.cache();
    let Some(series) = cache.series() else {
        return writeln!(out, "no comparison");
    };
    let values: Vec<String> = series.values().iter().map(|v| format!("{v}")).collect();
    writeln!(out, "tolerances: {}", values.join(", "))?;
    if let Some(stats) = cache.stats() {
        writeln!(
            out,
            "run: {}s, memory {} (peak {})",
            stats.elapsed_rounded(),
            format_bytes(stats.current_memory_bytes),
            format_bytes(stats.peak_memory_bytes)
        )?;
    }

    if let Ok(layers) = session.active_layers() {
        writeln!(
            out,
            "showing tolerance #{} = {}",
            layers.tolerance_index(),
            session.current_tolerance().unwrap_or_default()
        )?;
        for layer in layers.layers() {
            writeln!(
                out,
                "  {:<8} {:<44} {} vertices",
                layer.selector.to_string(),
                layer.algorithm.as_deref().unwrap_or("-"),
                layer.collection.vertex_count()
            )?;
        }
        let view = layers.view();
        writeln!(
            out,
            "basemap: {}, attribute panel: {}",
            on_off(view.basemap),
            on_off(view.attribute_panel)
        )?;
    }

    let Some(metrics) = session.metrics_snapshot() else {
        return Ok(());
    };
    writeln!(out, "metrics (original {} points)", metrics.original_points())?;
    if let Some(reduction) = metrics.reduction_at(session.tolerance_index()) {
        for slot in &reduction.slots {
            writeln!(
                out,
                "  {} {:<44} {} points, -{}",
                slot.slot,
                slot.algorithm,
                slot.simplified,
                format_percent(slot.percent_decrease)
            )?;
        }
    }
    for slot in SlotId::all() {
        if let Some(summary) = metrics.error_summary(slot) {
            writeln!(
                out,
                "  {slot} positional error: mean {:.4}, min {:.4}, max {:.4} at #{}",
                summary.mean, summary.min, summary.max, summary.worst_index
            )?;
        }
    }
    writeln!(out, "perimeter: {:.4}", metrics.perimeter())
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
