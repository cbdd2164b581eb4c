//! `mport version -t v1 v2`: compare two version strings.

use mport_schema::Version;
use std::cmp::Ordering;

/// Compare `v1` against `v2`. In test mode the process exits immediately
/// with 0/-1/+1 for less/equal/greater, matching the traditional
/// `pkg_version -t` contract; otherwise the symbol is printed and this
/// returns normally.
pub fn run(test: bool, v1: &str, v2: &str) {
    let a = Version::parse(v1);
    let b = Version::parse(v2);
    let (symbol, code) = match a.cmp(&b) {
        Ordering::Less => ("<", -1i32),
        Ordering::Equal => ("=", 0),
        Ordering::Greater => (">", 1),
    };
    println!("{symbol}");
    if test {
        std::process::exit(code);
    }
}
