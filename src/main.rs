use std::{path::PathBuf, time};

use anyhow::{bail, Context};
use chip8_core::{Chip8, Key, MachineState};
use clap::Parser;
use log::{info, warn};

const TIMER_HZ: u32 = 60;
const FRAME_INTERVAL: time::Duration = time::Duration::new(0, 1_000_000_000u32 / TIMER_HZ);

#[derive(Parser, Debug)]
#[command(version, about = "Run a CHIP-8 program headlessly", long_about = None)]
struct Args {
    #[arg(value_name = "PATH", help = "Program to load at 0x200", value_hint = clap::ValueHint::FilePath)]
    rom: PathBuf,
    #[arg(long, default_value_t = 660, help = "Instructions executed per second")]
    ips: u32,
    #[arg(long, help = "Stop after this many 60 Hz frames")]
    frames: Option<u64>,
    #[arg(long, value_name = "KEY", help = "Hold a key down for the whole run (1234/qwer/asdf/zxcv)")]
    hold: Vec<String>,
    #[arg(long, help = "Sleep between frames to run at real-time speed")]
    realtime: bool,
    #[arg(long, help = "Shift operations copy VY into VX first")]
    shift_uses_vy: bool,
    #[arg(long, help = "BNNN jumps add VX instead of V0")]
    jump_uses_vx: bool,
    #[arg(long, help = "FX55/FX65 advance I past the registers")]
    load_store_increments_i: bool,
    #[arg(long, help = "Print the screen whenever it changes")]
    live: bool,
    #[arg(long, help = "Print registers and memory after the run")]
    dump_memory: bool,
}

struct Runner {
    chip8: Chip8,
    args: Args,
    sound_on: bool,
}

impl Runner {
    pub fn new(args: Args) -> anyhow::Result<Self> {
        let ops_per_frame = (args.ips / TIMER_HZ).max(1) as usize;
        let mut chip8 = Chip8::new()
            .shift_uses_vy(args.shift_uses_vy)
            .jump_uses_vx(args.jump_uses_vx)
            .load_store_increments_i(args.load_store_increments_i)
            .ops_per_cycle(ops_per_frame);

        let rom = std::fs::read(&args.rom).context("read rom file")?;
        chip8.load_program(&rom).context("load rom into memory")?;

        for label in &args.hold {
            let Some(index) = Key::from_label(label).index() else {
                bail!("unknown key label '{}'", label);
            };
            chip8.set_key(index, true).context("hold key")?;
        }

        Ok(Self {
            chip8,
            args,
            sound_on: false,
        })
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut frame = 0u64;
        while self.args.frames.map_or(true, |limit| frame < limit) {
            let state = self
                .chip8
                .cycle()
                .with_context(|| format!("frame {}", frame))?;
            self.update_sound();
            if self.args.live && self.chip8.is_fb_dirty() {
                self.chip8.take_framebuffer();
                self.print_screen();
            }

            if let MachineState::AwaitingKey { register } = state {
                if self.args.hold.is_empty() && self.args.frames.is_none() {
                    warn!("waiting for a key into {:?} with no keys held, stopping", register);
                    break;
                }
            }

            frame += 1;
            if self.args.realtime {
                std::thread::sleep(FRAME_INTERVAL);
            }
        }
        info!("ran {} frames", frame);
        Ok(())
    }

    fn update_sound(&mut self) {
        let playing = self.chip8.is_sound_playing();
        if playing != self.sound_on {
            info!("tone {}", if playing { "on" } else { "off" });
            self.sound_on = playing;
        }
    }

    fn print_screen(&self) {
        let border = "-".repeat(chip8_core::SCREEN_WIDTH);
        println!("{}", border);
        print!("{}", self.chip8.screen());
        println!("{}", border);
    }

    pub fn render(&self) {
        self.print_screen();
        if self.args.dump_memory {
            println!("{}", self.chip8);
        }
    }
}

fn main() -> std::process::ExitCode {
    env_logger::init();

    let args = Args::parse();
    let mut runner = match Runner::new(args) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("init failed: {:?}", e);
            return std::process::ExitCode::FAILURE;
        }
    };

    let result = runner.run();
    runner.render();

    if let Err(e) = result {
        eprintln!("run failed: {:?}", e);
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}
