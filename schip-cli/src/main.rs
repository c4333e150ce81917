//! Entrypoint for CLI
use std::{env, fs, time::Instant};

use log::{error, info, LevelFilter};
use schip::{prelude::*, IMPL_VERSION};

use self::{config::Config, error::AppError};

mod config;
mod error;

static USAGE: &str = r#"
usage: schip [run] FILE [-c CONFIG] [-f FRAMES]
       schip dis FILE

commands:
    run     Run the target ROM file headless, then print the display
    dis     Disassemble the target ROM into readable assembly

options:
    -c, --config CONFIG    YAML file with clock speed, quirks and scripted input
    -f, --frames FRAMES    Number of 60 Hz frames to run (default 120)

examples:
    schip maze.ch8
    schip run breakout.ch8 -f 600
    schip dis breakout.ch8
"#;

fn run_rom(filepath: &str, config: Config) -> Result<(), AppError> {
    let mut vm = Chip8Vm::new(config.vm_conf());
    vm.load_rom_file(filepath)?;

    info!(
        "running {} frames at {}",
        config.frames,
        vm.config().clock_frequency
    );

    // Input for the first frame goes in before it starts,
    // the rest are applied after the preceding frame.
    apply_input(&mut vm, &config, 0);

    let mut runner = Runner::new(vm).with_throttle(config.throttle);
    let mut buzzer = false;

    let start = Instant::now();
    let result = runner.run_frames(config.frames, |index, vm, frame| {
        if frame.sound != buzzer {
            buzzer = frame.sound;
            log::debug!("frame {index}: buzzer {}", if buzzer { "on" } else { "off" });
        }
        apply_input(vm, &config, index + 1);
    });
    let end = Instant::now();

    info!(
        "time taken: {}ms",
        end.duration_since(start).as_nanos() as f64 / 1_000_000.0
    ); // to millis

    let vm = runner.vm();
    println!("{}", vm.display());
    println!("{}", vm.dump_registers().map_err(std::io::Error::other)?);

    if let Err(err) = result {
        error!("program faulted: {err}");
        return Err(err.into());
    }

    Ok(())
}

fn apply_input(vm: &mut Chip8Vm, config: &Config, frame: usize) {
    for event in config.input_at(frame) {
        log::debug!("frame {frame}: {} pressed={}", event.key, event.pressed);
        vm.set_key(event.key, event.pressed);
    }
}

fn run_disassembler(filepath: &str) -> Result<(), AppError> {
    let bytecode = fs::read(filepath)?;

    let mut buf = String::new();
    Disassembler::new(&bytecode)
        .disassemble(&mut buf)
        .map_err(std::io::Error::other)?;
    print!("{buf}");

    Ok(())
}

fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
        .unwrap();

    let result = match parse_args(env::args().skip(1)) {
        Ok(Cmd::Run {
            filepath,
            config,
            frames,
        }) => load_config(config.as_deref(), frames)
            .and_then(|config| run_rom(&filepath, config)),
        Ok(Cmd::Dis { filepath }) => run_disassembler(&filepath),
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        if err.is_usage() {
            eprintln!("{err}");
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }

        error!("{err}");
        std::process::exit(1)
    }
}

fn load_config(filepath: Option<&str>, frames: Option<usize>) -> Result<Config, AppError> {
    let mut config = match filepath {
        Some(filepath) => Config::from_file(filepath)?,
        None => Config::default(),
    };

    if let Some(frames) = frames {
        config.frames = frames;
    }

    Ok(config)
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Cmd, AppError> {
    let mut args = args.peekable();
    let cmd = args.peek().cloned();

    match cmd.as_deref() {
        Some("dis") => {
            args.next();
            Ok(Cmd::Dis {
                filepath: consume_arg(&mut args, "missing ROM file")?,
            })
        }
        Some("run") => {
            args.next();
            parse_run(args)
        }
        // Running is the default command.
        Some(_) => parse_run(args),
        None => Err(AppError::usage("missing command")),
    }
}

fn parse_run(mut args: impl Iterator<Item = String>) -> Result<Cmd, AppError> {
    let mut filepath = None;
    let mut config = None;
    let mut frames = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => config = Some(consume_arg(&mut args, "missing config file")?),
            "-f" | "--frames" => {
                let value = consume_arg(&mut args, "missing frame count")?;
                let count = value
                    .parse::<usize>()
                    .map_err(|_| AppError::usage(format!("invalid frame count: {value}")))?;
                frames = Some(count);
            }
            flag if flag.starts_with('-') => {
                return Err(AppError::usage(format!("unknown option: {flag}")))
            }
            _ if filepath.is_none() => filepath = Some(arg.clone()),
            _ => return Err(AppError::usage(format!("unexpected argument: {arg}"))),
        }
    }

    Ok(Cmd::Run {
        filepath: filepath.ok_or_else(|| AppError::usage("missing ROM file"))?,
        config,
        frames,
    })
}

/// Consumes the next argument, or fails with a usage error if it doesn't exist.
fn consume_arg(args: &mut impl Iterator<Item = String>, missing: &str) -> Result<String, AppError> {
    args.next().ok_or_else(|| AppError::usage(missing))
}

fn print_usage() {
    println!("SCHIP v{IMPL_VERSION}");
    println!("{USAGE}");
}

#[derive(Debug, PartialEq, Eq)]
enum Cmd {
    /// Run file
    Run {
        filepath: String,
        config: Option<String>,
        frames: Option<usize>,
    },
    /// Disassemble
    Dis { filepath: String },
}
