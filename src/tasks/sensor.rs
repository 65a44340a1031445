// SeizeAlert - Sensor Task
//
// Reads one accelerometer sample per sample period and forwards it to the
// monitor task.  A failed read is sent as a zero vector; the next period
// simply tries again.

use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use seizealert::{Input, Sample};

use crate::drivers::imu::{Mpu6050, SharedBus};

pub fn sensor_task(bus: SharedBus, input_tx: Sender<Input>, interval: Duration) {
    log::info!("Sensor task started ({} ms period)", interval.as_millis());

    let imu = Mpu6050::new(bus);
    if let Err(e) = imu.init() {
        log::error!("MPU6050 init failed in sensor task: {}", e);
        return;
    }

    loop {
        let tick_start = Instant::now();

        let sample = imu.read_accel().unwrap_or_else(|e| {
            log::warn!("IMU read error: {}", e);
            Sample::ZERO
        });

        if input_tx.send(Input::Sample(sample)).is_err() {
            // Receiver dropped - monitor task has exited. Shut down cleanly.
            log::warn!("Input channel closed - exiting sensor task");
            return;
        }

        // Sleep for the remainder of the sampling interval.
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}
