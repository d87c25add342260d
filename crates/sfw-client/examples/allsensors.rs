// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Starts every sensor kind matching an optional name-prefix filter on
//! the command line, prints each reading as it arrives, and runs until
//! interrupted.

use std::sync::Arc;

use sensorfw::{Plugin, Sensor, Service, SensorKind};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let filters: Vec<String> = std::env::args().skip(1).collect();
    let selected = |kind: SensorKind| -> bool {
        filters.is_empty() || filters.iter().any(|f| kind.sensor_name().starts_with(f.as_str()))
    };

    println!("Initialize");
    let service = Service::connect().await?;

    let mut sensors = Vec::new();
    for kind in SensorKind::ALL {
        let starting = selected(kind);
        println!("{} {}", if starting { "starting" } else { "ignoring" }, kind.sensor_name());
        if !starting {
            continue;
        }
        let plugin = Plugin::instance(kind, Arc::clone(&service));
        let sensor = Sensor::new(kind, plugin);
        sensor.add_reading_changed(move |reading| {
            println!("{reading:?}");
        });
        sensor.set_datarate(5.0);
        sensor.start();
        sensors.push(sensor);
    }

    println!("Mainloop");
    tokio::signal::ctrl_c().await?;

    println!("Cleanup");
    drop(sensors);
    Ok(())
}
