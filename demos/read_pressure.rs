use tpg26x::{Device, DEFAULT_BAUDRATE};

#[tokio::main]
async fn main() -> tpg26x::Result<()> {
    let path = "/dev/ttyUSB0".to_string();
    let mut device = Device::new(&path, DEFAULT_BAUDRATE)?;
    let (first, second) = device.identification().await?;
    eprintln!("Connected to: {} / {}\n", first, second);
    println!("Pressure: {}", device.pressure().await?);
    Ok(())
}
