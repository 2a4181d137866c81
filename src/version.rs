/*============================================================
  Synavera Project: Pro-Hook
  Module: prohook_core::version
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Compare Debian package version strings with the same total
    order dpkg and apt apply.

  Security / Safety Notes:
    Pure computation; no I/O performed in this module.

  Dependencies:
    None beyond std.

  Operational Scope:
    Used by the restricted-channel diff to decide whether an
    index version is newer than the installed one.

  Revision History:
    2025-11-12 COD  Replaced external vercmp calls with an
                    in-process Debian comparator.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic ordering, equal inputs compare equal
    - No allocation on the comparison path
============================================================*/

use std::cmp::Ordering;

/// Compare two version strings using Debian ordering.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (epoch_a, upstream_a, revision_a) = split_version(a);
    let (epoch_b, upstream_b, revision_b) = split_version(b);

    compare_fragment(epoch_a, epoch_b)
        .then_with(|| compare_fragment(upstream_a, upstream_b))
        .then_with(|| compare_fragment(revision_a, revision_b))
}

/// Strict "is newer than" predicate built on [`compare_versions`].
pub fn is_newer(candidate: &str, installed: &str) -> bool {
    compare_versions(candidate, installed) == Ordering::Greater
}

/// Split `[epoch:]upstream[-revision]`, defaulting epoch and revision to `0`.
fn split_version(raw: &str) -> (&str, &str, &str) {
    let raw = raw.trim();
    let (epoch, rest) = match raw.split_once(':') {
        Some((epoch, rest)) => (epoch, rest),
        None => ("0", raw),
    };
    let (upstream, revision) = match rest.rsplit_once('-') {
        Some((upstream, revision)) => (upstream, revision),
        None => (rest, "0"),
    };
    (epoch, upstream, revision)
}

/// Weight of a character inside a non-digit run.
fn order(c: Option<u8>) -> i32 {
    match c {
        None => 0,
        Some(b'~') => -1,
        Some(c) if c.is_ascii_digit() => 0,
        Some(c) if c.is_ascii_alphabetic() => i32::from(c),
        Some(c) => i32::from(c) + 256,
    }
}

fn is_digit(c: Option<&u8>) -> bool {
    c.map_or(false, u8::is_ascii_digit)
}

/// dpkg's `verrevcmp`: alternate non-digit and digit runs until one differs.
fn compare_fragment(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut i, mut j) = (0usize, 0usize);

    while i < a.len() || j < b.len() {
        while (i < a.len() && !a[i].is_ascii_digit()) || (j < b.len() && !b[j].is_ascii_digit())
        {
            let ac = order(a.get(i).copied());
            let bc = order(b.get(j).copied());
            if ac != bc {
                return ac.cmp(&bc);
            }
            i += 1;
            j += 1;
        }

        while a.get(i) == Some(&b'0') {
            i += 1;
        }
        while b.get(j) == Some(&b'0') {
            j += 1;
        }

        let mut first_diff = Ordering::Equal;
        while is_digit(a.get(i)) && is_digit(b.get(j)) {
            if first_diff == Ordering::Equal {
                first_diff = a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }
        if is_digit(a.get(i)) {
            return Ordering::Greater;
        }
        if is_digit(b.get(j)) {
            return Ordering::Less;
        }
        if first_diff != Ordering::Equal {
            return first_diff;
        }
    }

    Ordering::Equal
}
