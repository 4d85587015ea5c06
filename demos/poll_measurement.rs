use es51922::{Device, DEFAULT_BAUDRATE, DEFAULT_TTY};

#[tokio::main]
async fn main() -> es51922::Result<()> {
    let mut device = Device::new(DEFAULT_TTY, DEFAULT_BAUDRATE)?;

    while let Some(reading) = device.next_reading().await {
        let reading = reading?;
        match reading.result {
            Ok(mea) => match mea.value {
                Some(value) => println!("Value: {} {}", value, mea.unit),
                None => println!("{}", mea),
            },
            Err(err) => {
                println!("Skipped {:?}: {}", reading.raw, err);
            }
        }
    }
    Ok(())
}
