//! Slot message tools: encode, decode and the label table.

use anyhow::{anyhow, bail, Context, Result};
use beacon::core::comms::{self, Label, LABELS};
use beacon::prelude::*;
use colored::Colorize;

pub fn encode(label: &str, fields: &[u32]) -> Result<()> {
    let flag = encode_flag(label, fields)?;
    println!("{} {}", flag.to_string().cyan(), format!("({:#08x})", flag).dimmed());
    Ok(())
}

pub fn encode_flag(label: &str, fields: &[u32]) -> Result<u32> {
    let label = Label::from_name(label).ok_or_else(|| anyhow!("Unknown label: {label} (see `beacon labels`)"))?;
    let message = Message::new(label, fields);
    comms::encode(&message).with_context(|| format!("Cannot encode {message}"))
}

pub fn decode(flag: &str) -> Result<()> {
    let flag = parse_flag(flag)?;
    match try_decode(flag) {
        Some(message) => {
            println!("{}", message.label().to_string().green().bold());
            let widths = message.label().spec().field_bits;
            for (i, (value, bits)) in message.fields().iter().zip(widths).enumerate() {
                println!("  field {i} ({bits} bits): {}", value.to_string().cyan());
            }
        }
        None => println!("{} {:#08x} is not a Beacon message", "•".yellow(), flag),
    }
    Ok(())
}

/// Accepts decimal or `0x`-prefixed hex.
pub fn parse_flag(text: &str) -> Result<u32> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse::<u32>(),
    };
    let flag = parsed.with_context(|| format!("Not a slot value: {text}"))?;
    if flag >= 1 << comms::FLAG_BITS {
        bail!("{flag} does not fit in {} bits", comms::FLAG_BITS);
    }
    Ok(flag)
}

pub fn labels() -> Result<()> {
    println!(
        "{:<20} {:>5} {:>8}  {}",
        "LABEL".bold(),
        "TAG".bold(),
        "STRIDE".bold(),
        "FIELDS".bold()
    );
    for spec in LABELS.iter() {
        let fields = if spec.field_bits.is_empty() {
            "-".to_string()
        } else {
            spec.field_bits
                .iter()
                .map(|bits| bits.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!("{:<20} {:>5} {:>8}  {}", spec.label.name(), spec.tag, spec.stride(), fields);
    }
    Ok(())
}
