use anyhow::{Context, Result, bail};
use std::collections::HashSet;

/// Seed used when no tokens are supplied.
pub const DEFAULT_SEED: u64 = 1337;

/// Split a comma-separated CLI value, trimming entries and dropping blanks.
#[must_use]
pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Resolve CLI seed tokens into a deduplicated, ordered list.
///
/// Supports decimal integers (negative values use their magnitude), `0x`
/// hex literals and inclusive ranges written `start..end`.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        for seed in parse_token(token)? {
            if seen.insert(seed) {
                seeds.push(seed);
            }
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }
    Ok(seeds)
}

fn parse_token(token: &str) -> Result<Vec<u64>> {
    if let Some((start, end)) = token.split_once("..") {
        let start = parse_single(start)?;
        let end = parse_single(end)?;
        if start > end {
            bail!("Seed range {token} runs backwards");
        }
        if end - start >= 10_000 {
            bail!("Seed range {token} is too large");
        }
        return Ok((start..=end).collect());
    }
    Ok(vec![parse_single(token)?])
}

fn parse_single(token: &str) -> Result<u64> {
    let token = token.trim();
    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).with_context(|| format!("Invalid hex seed: {token}"));
    }
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    token
        .parse::<u64>()
        .with_context(|| format!("Unrecognized seed token: {token}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn mixed_tokens_resolve_in_order_without_duplicates() {
        let seeds = resolve_seed_inputs(&tokens(&["3", "0x10", "1..3", "-7"])).unwrap();
        assert_eq!(seeds, vec![3, 16, 1, 2, 7]);
    }

    #[test]
    fn empty_input_falls_back_to_default() {
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
    }

    #[test]
    fn split_csv_drops_blanks() {
        assert_eq!(split_csv(" strict, ,smart,"), vec!["strict", "smart"]);
        assert!(split_csv("").is_empty());
        assert_eq!(resolve_seed_inputs(&split_csv("5, 0x5 ,")).unwrap(), vec![5]);
    }

    #[test]
    fn bad_tokens_are_reported() {
        assert!(resolve_seed_inputs(&tokens(&["nottingham"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["9..2"])).is_err());
    }
}
