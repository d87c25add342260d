// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Starts the proximity sensor and prints each reading until
//! interrupted.

use sensorfw::{Plugin, Reading, Sensor, Service, SensorKind};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("Initialize");
    let service = Service::connect().await?;
    let plugin = Plugin::instance(SensorKind::Proximity, service);
    let sensor = Sensor::new(SensorKind::Proximity, plugin);
    sensor.add_reading_changed(|reading| {
        if let Reading::Proximity(sample) = reading {
            println!(
                "proximitysensor: time={} distance={} proximity={}",
                sample.timestamp,
                sample.distance,
                sample.is_near(),
            );
        }
    });
    sensor.start();

    println!("Mainloop");
    tokio::signal::ctrl_c().await?;

    println!("Cleanup");
    drop(sensor);
    Ok(())
}
