//! CrashBuddy - Main Entry Point

use anyhow::Context;
use crashbuddy::{
    init_logging, CrashBuddyConfig, CrashSample, GattHandle, RecordOutcome, Recorder,
    SensorService, SensorSimulator,
};
use gatt_table::{AttributeIndex, AttributeTable, CrashService};
use ring_buffer::{Record, RingBuffer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CrashBuddyConfig::load().context("loading configuration")?;
    init_logging(config.log_level()?, config.log_format);

    info!("=== CrashBuddy v{} ===", env!("CARGO_PKG_VERSION"));

    // Crash log storage lives for the whole program, like a static array
    let storage: &'static mut [u8] = Box::leak(vec![0u8; config.buffer_bytes].into_boxed_slice());
    let ring = RingBuffer::over(storage, CrashSample::SIZE).context("creating crash log")?;

    let table = AttributeTable::new(config.start_handle).context("registering GATT table")?;
    let service = CrashService::new(table, config.service_config())?;
    let mut recorder = Recorder::new(ring, service, config.post_crash_samples)?;
    let gatt = recorder.gatt();

    let mut sensor = SensorService::spawn(
        SensorSimulator::new(&config),
        config.sample_rate_hz,
        config.max_samples,
    );

    let mut recorded = 0u32;
    while let Some(sample) = sensor.next().await {
        let outcome = recorder.record(&sample).await?;
        recorded += 1;

        for note in recorder.take_notifications() {
            info!("Notify handle 0x{:04X}: {:02X?}", note.handle, note.value);
        }
        if outcome == RecordOutcome::Frozen {
            break;
        }
    }
    drop(sensor);
    info!("Sampling finished after {} samples", recorded);

    download(&gatt).await
}

/// Act as a client pulling the data points characteristic with long reads
async fn download(gatt: &GattHandle) -> anyhow::Result<()> {
    let handle = gatt.handle_of(AttributeIndex::CharDataPointsInitial).await;
    let mut offset = 0;
    let mut samples = Vec::new();

    loop {
        let chunk = gatt
            .serve_read(handle, offset)
            .await
            .with_context(|| format!("reading data points at offset {}", offset))?;
        if chunk.is_empty() {
            break;
        }
        offset += chunk.len();
        samples.extend(chunk.chunks_exact(CrashSample::SIZE).map(CrashSample::decode));
    }

    let peak = samples.iter().max_by_key(|s| s.g_force_milli());
    match (samples.first(), samples.last(), peak) {
        (Some(first), Some(last), Some(peak)) => info!(
            "Downloaded {} samples ({} bytes) spanning {}..{} ms, peak {} mg at {} ms",
            samples.len(),
            offset,
            first.timestamp_ms,
            last.timestamp_ms,
            peak.g_force_milli(),
            peak.timestamp_ms
        ),
        _ => info!("No crash data logged"),
    }

    Ok(())
}
