//! Merge-based set operations on ascending, duplicate-free document id lists.

use crate::DocId;

/// Two-pointer intersection, O(|p| + |q|).
pub fn intersect_two(p: &[DocId], q: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(p.len().min(q.len()));
    let (mut i, mut j) = (0, 0);
    while i < p.len() && j < q.len() {
        let (x, y) = (p[i], q[j]);
        if x == y {
            out.push(x);
            i += 1;
            j += 1;
        } else if x < y {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

pub fn union_two(p: &[DocId], q: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(p.len() + q.len());
    let (mut i, mut j) = (0, 0);
    while i < p.len() && j < q.len() {
        let (x, y) = (p[i], q[j]);
        if x == y {
            out.push(x);
            i += 1;
            j += 1;
        } else if x < y {
            out.push(x);
            i += 1;
        } else {
            out.push(y);
            j += 1;
        }
    }
    out.extend_from_slice(&p[i..]);
    out.extend_from_slice(&q[j..]);
    out
}

/// Elements of `p` not in `q`.
pub fn difference(p: &[DocId], q: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(p.len());
    let mut j = 0;
    for &x in p {
        while j < q.len() && q[j] < x {
            j += 1;
        }
        if j < q.len() && q[j] == x {
            continue;
        }
        out.push(x);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    /// Every subset of 1..=6 as an ascending list.
    fn subsets() -> Vec<Vec<DocId>> {
        (0u32..64).map(|mask| (1..=6).filter(|d| mask & (1 << (d - 1)) != 0).collect()).collect()
    }

    fn set(v: &[DocId]) -> BTreeSet<DocId> { v.iter().copied().collect() }

    #[test]
    fn matches_reference_set_algebra() {
        let all = subsets();
        for p in &all {
            for q in &all {
                let (sp, sq) = (set(p), set(q));
                assert_eq!(intersect_two(p, q), sp.intersection(&sq).copied().collect::<Vec<_>>());
                assert_eq!(union_two(p, q), sp.union(&sq).copied().collect::<Vec<_>>());
                assert_eq!(difference(p, q), sp.difference(&sq).copied().collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn textbook_intersection() {
        assert_eq!(intersect_two(&[1, 2, 4, 11, 31, 45, 173, 174], &[2, 31, 54, 101]), vec![2, 31]);
        assert!(intersect_two(&[], &[1, 2]).is_empty());
    }
}
