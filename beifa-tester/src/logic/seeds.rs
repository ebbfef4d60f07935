use anyhow::{Context, Result, bail};

/// Widest range a single token may expand to.
const MAX_RANGE_SPAN: u64 = 10_000;

/// Resolve CLI seed tokens into a deduplicated seed list.
///
/// Supports literal integers (negative values use their magnitude) and
/// inclusive ranges written `a..b` or `a-b`.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            push_unique(&mut seeds, value.unsigned_abs());
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            push_unique(&mut seeds, value);
            continue;
        }

        if let Some((low, high)) = token.split_once("..").or_else(|| token.split_once('-')) {
            let low = parse_bound(token, low)?;
            let high = parse_bound(token, high.trim_start_matches('='))?;
            if low > high {
                bail!("Seed range {token} is empty");
            }
            if high - low >= MAX_RANGE_SPAN {
                bail!("Seed range {token} spans more than {MAX_RANGE_SPAN} seeds");
            }
            for seed in low..=high {
                push_unique(&mut seeds, seed);
            }
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    if seeds.is_empty() {
        seeds.push(1337);
    }

    Ok(seeds)
}

fn parse_bound(token: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .with_context(|| format!("invalid bound `{raw}` in seed range {token}"))
}

fn push_unique(seeds: &mut Vec<u64>, seed: u64) {
    if !seeds.contains(&seed) {
        seeds.push(seed);
    }
}

/// Seed for the `run`-th game played from `base`.
#[must_use]
pub const fn seed_for_run(base: u64, run: usize) -> u64 {
    base.wrapping_add(run as u64)
}
