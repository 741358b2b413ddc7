use tpg26x::{Device, DEFAULT_BAUDRATE};

#[tokio::main]
async fn main() -> tpg26x::Result<()> {
    let path = "/dev/ttyUSB0".to_string();
    let mut device = Device::new(&path, DEFAULT_BAUDRATE)?;

    // A previous run may have left the controller streaming.
    device.stop_continuous_measurement().await?;

    let mut stream = device.start_continuous_measurement(1).await?;
    for _ in 0..30 {
        let (first, second) = stream.read_frame().await?;
        // Each frame carries the readings of both gauge channels.
        println!("Gauge 1: {}\tGauge 2: {}", first, second);
    }
    stream.stop().await
}
