#![deny(clippy::unwrap_used)]

use byteorder::{LittleEndian, WriteBytesExt};
use chrono::Local;
use clap::{arg, command, value_parser};
use es51922::measurement::{CsvRecord, Measurement};
use es51922::{proto, Device, DEFAULT_BAUDRATE};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::PathBuf;
use std::process::exit;
use tracing::{error, info, warn, Level};

#[derive(Debug, Copy, Clone)]
pub enum OutputMode {
    Csv,
    Plot,
    Readable,
    Json,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Plot => f.write_str("plot"),
            Self::Readable => f.write_str("readable"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl clap::ValueEnum for OutputMode {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Csv, Self::Plot, Self::Readable, Self::Json]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Csv => clap::builder::PossibleValue::new("csv"),
            Self::Plot => clap::builder::PossibleValue::new("plot"),
            Self::Readable => clap::builder::PossibleValue::new("readable"),
            Self::Json => clap::builder::PossibleValue::new("json"),
        })
    }
}

/// Destination of decoded measurements
enum Sink {
    Csv(csv::Writer<BufWriter<File>>),
    Plot(Option<File>),
    Readable(Box<dyn Write>),
    Json(Box<dyn Write>),
}

impl Sink {
    fn open(mode: OutputMode, file: Option<&PathBuf>) -> proto::Result<Self> {
        let writer = |file: Option<&PathBuf>| -> proto::Result<Box<dyn Write>> {
            let output: Box<dyn Write> = match file {
                Some(path) => Box::new(BufWriter::new(File::create(path)?)),
                None => Box::new(std::io::stdout().lock()),
            };
            Ok(output)
        };

        Ok(match mode {
            OutputMode::Csv => {
                let path = file.cloned().unwrap_or_else(|| {
                    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
                    PathBuf::from(format!("measurement_{}.csv", timestamp))
                });
                info!("Writing to file \"{}\"", path.display());
                let wtr = csv::WriterBuilder::new()
                    .delimiter(b';')
                    .from_writer(BufWriter::new(File::create(path)?));
                Sink::Csv(wtr)
            }
            OutputMode::Plot => Sink::Plot(
                file.map(|path| OpenOptions::new().create(true).append(true).open(path))
                    .transpose()?,
            ),
            OutputMode::Readable => Sink::Readable(writer(file)?),
            OutputMode::Json => Sink::Json(writer(file)?),
        })
    }

    fn write(&mut self, mea: &Measurement) -> proto::Result<()> {
        match self {
            Sink::Csv(wtr) => {
                wtr.serialize(CsvRecord::new(Local::now().naive_local(), mea))?;
                wtr.flush()?;
            }
            Sink::Plot(file) => {
                let line = mea.plot_line();
                if let Some(file) = file {
                    writeln!(file, "{}", line)?;
                }
                println!("{}", line);
            }
            Sink::Readable(output) => {
                writeln!(output, "{} {}", Local::now().format("%H:%M:%S%.6f"), mea)?;
                output.flush()?;
            }
            Sink::Json(output) => {
                serde_json::to_writer(&mut *output, mea)?;
                writeln!(output)?;
                output.flush()?;
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let matches =
        command!() // requires `cargo` feature
            .arg(
                arg!(
                    -m --mode <MODE> "Output mode"
                )
                .default_value("csv")
                .value_parser(value_parser!(OutputMode)),
            )
            .arg(
                arg!(
                    -f --file <FILE> "Output file"
                )
                .required(false)
                .value_parser(value_parser!(PathBuf)),
            )
            .arg(
                arg!(
                    -p --device <PORT> "Serial port of the meter, reads stdin if omitted"
                )
                .required(false)
                .value_parser(value_parser!(PathBuf)),
            )
            .arg(
                arg!(
                    -b --baudrate <BAUDRATE> "Baudrate"
                )
                .default_value(DEFAULT_BAUDRATE.to_string())
                .value_parser(value_parser!(u32)),
            )
            .arg(
                arg!(
                    --fifo <FIFO> "Write values as f64 (LE) to FIFO file, NaN on overload"
                )
                .required(false)
                .value_parser(value_parser!(PathBuf)),
            )
            .arg(arg!(
                --verbose "Enable verbose output"
            ))
            .get_matches();

    let level = if matches.get_flag("verbose") {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match handle_args(&matches).await {
        Ok(()) => {}
        Err(proto::Error::Serial(err)) => {
            let port = matches
                .get_one::<PathBuf>("device")
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            if err.kind() == tokio_serial::ErrorKind::NoDevice
                || matches!(err.kind(), tokio_serial::ErrorKind::Io(ErrorKind::NotFound))
            {
                error!("{}: File not found", port);
            } else {
                error!("Serial port error: {} [device: {}]", err, port);
            }
            exit(-1);
        }
        // Output closed by the consumer, e.g. piped into `head`
        Err(proto::Error::Io(err)) if err.kind() == ErrorKind::BrokenPipe => {}
        Err(err) => {
            error!("{}", err);
            exit(-1);
        }
    }
}

async fn handle_args(matches: &clap::ArgMatches) -> proto::Result<()> {
    let baud_rate = matches
        .get_one::<u32>("baudrate")
        .unwrap_or(&DEFAULT_BAUDRATE);
    let mode = matches
        .get_one::<OutputMode>("mode")
        .unwrap_or(&OutputMode::Csv);

    let mut device = match matches.get_one::<PathBuf>("device") {
        Some(port_path) => {
            let device = Device::new(port_path.to_string_lossy(), *baud_rate)?;
            info!("Connected to: {}", port_path.display());
            device
        }
        None => Device::from_reader(tokio::io::stdin()),
    };

    let mut fifo = matches
        .get_one::<PathBuf>("fifo")
        .map(|path| OpenOptions::new().write(true).open(path))
        .transpose()?;

    let mut sink = Sink::open(*mode, matches.get_one::<PathBuf>("file"))?;

    while let Some(reading) = device.next_reading().await {
        let reading = reading?;
        let mea = match reading.result {
            Ok(mea) => mea,
            Err(err) => {
                warn!("Error \"{}\" in packet from multimeter: {:?}", err, reading.raw);
                continue;
            }
        };

        sink.write(&mea)?;

        if let Some(binout) = &mut fifo {
            binout.write_f64::<LittleEndian>(mea.normal_value().unwrap_or(f64::NAN))?;
        }
    }

    Ok(())
}
