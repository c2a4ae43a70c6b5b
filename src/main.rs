use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;

use gifseq::editor::{drop_leading_frames, edit_gif, retime};
use gifseq::{DecodeStatus, FrameSequence, HeapAllocator, TrimOptions};

mod ppm_writer;

const USAGE: &str = "usage:
    gifseq info <file>
    gifseq retime <in> <out> <delay> <last-frame-hold> <loop-count>
    gifseq trim <in> <out> <delay> <frames-to-keep>
    gifseq drop-leading <in> <out> <frames-to-keep>
    gifseq frames <in> <out-dir>

delays are in hundredths of a second";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        ["info", file] => info(Path::new(file)),
        ["retime", input, output, delay, hold, loops] => {
            let mut buf = read(input)?;
            let summary = retime(&mut buf, number(delay)?, number(hold)?, number(loops)?)
                .with_context(|| format!("failed to retime {}", input))?;
            println!(
                "{} delays and {} loop counts rewritten",
                summary.delays_patched, summary.loop_counts_patched
            );
            write(output, &buf)
        }
        ["trim", input, output, delay, frames] => {
            let mut buf = read(input)?;
            let options = TrimOptions::new(number(delay)?, number(frames)?);
            let summary =
                edit_gif(&mut buf, &options).with_context(|| format!("failed to trim {}", input))?;
            println!(
                "kept {} of {} frames ({} distinct), last frame holds {}",
                summary.kept_frames, summary.frames, summary.distinct_frames, summary.last_frame_hold
            );
            write(output, &buf)
        }
        ["drop-leading", input, output, frames] => {
            let mut buf = read(input)?;
            let dropped = drop_leading_frames(&mut buf, number(frames)?)
                .with_context(|| format!("failed to drop frames of {}", input))?;
            println!("dropped {} frames", dropped);
            write(output, &buf)
        }
        ["frames", input, dir] => frames(Path::new(input), Path::new(dir)),
        _ => bail!("{}", USAGE),
    }
}

fn read(path: &str) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path))
}

fn write(path: &str, buf: &[u8]) -> Result<()> {
    fs::write(path, buf).with_context(|| format!("failed to write {}", path))
}

fn number<T: std::str::FromStr>(arg: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    arg.parse().with_context(|| format!("invalid number {:?}", arg))
}

fn parse(path: &Path) -> Result<FrameSequence> {
    let buf = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    FrameSequence::parse(buf).with_context(|| format!("failed to parse {}", path.display()))
}

fn info(path: &Path) -> Result<()> {
    let sequence = parse(path)?;
    println!("{}x{}, {} frames", sequence.width(), sequence.height(), sequence.frame_count());
    match sequence.loop_count() {
        Some(loop_count) => println!("loop count: {:?}", loop_count),
        None => println!("no loop extension"),
    }
    for frame in sequence.frames() {
        let (left, top, width, height) = frame.rect();
        println!(
            "frame {}: {}x{}+{}+{} delay {}cs disposal {:?}{}{}",
            frame.index(),
            width,
            height,
            left,
            top,
            frame.delay_centiseconds(),
            frame.disposal_method(),
            if frame.interlace() { " interlaced" } else { "" },
            match frame.transparent_index() {
                Some(index) => format!(" transparent {}", index),
                None => String::new(),
            },
        );
    }
    Ok(())
}

fn frames(input: &Path, dir: &Path) -> Result<()> {
    let sequence = parse(input)?;
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut decoder = sequence.decoder(HeapAllocator);
    for index in 0..sequence.frame_count() {
        let pixels = decoder.decode_frame(index)?;
        let path: PathBuf = dir.join(format!("frame_{}.ppm", index));
        ppm_writer::write_ppm(&path, sequence.width(), sequence.height(), pixels)?;
        if decoder.status() == DecodeStatus::PartialDecode {
            info!("frame {} is incomplete", index);
        }
    }
    println!("wrote {} frames to {}", sequence.frame_count(), dir.display());
    Ok(())
}
