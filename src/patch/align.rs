//! List alignment for the differ.
//!
//! Two lists are aligned with a longest common subsequence over a match
//! predicate. Between consecutive matches, leftover items are paired
//! positionally; whatever remains on the old side is deleted and whatever
//! remains on the new side is inserted.

/// One step of an alignment, in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Old item `.0` corresponds to new item `.1`.
    Pair(usize, usize),
    /// Old item is gone.
    Delete(usize),
    /// New item has no counterpart.
    Insert(usize),
}

/// Align `old` against `new`.
pub fn align<A, B>(old: &[A], new: &[B], matches: impl Fn(&A, &B) -> bool) -> Vec<Step> {
    let (n, m) = (old.len(), new.len());

    // lcs[i][j] = length of the LCS of old[i..] and new[j..]
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if matches(&old[i], &new[j]) {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut anchors = Vec::with_capacity(lcs[0][0]);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if matches(&old[i], &new[j]) && lcs[i][j] == lcs[i + 1][j + 1] + 1 {
            anchors.push((i, j));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }

    let mut steps = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0, 0);
    for (ai, aj) in anchors.into_iter().chain(std::iter::once((n, m))) {
        fill_gap(&mut steps, i..ai, j..aj);
        if ai < n && aj < m {
            steps.push(Step::Pair(ai, aj));
        }
        i = ai + 1;
        j = aj + 1;
    }
    steps
}

fn fill_gap(steps: &mut Vec<Step>, old: std::ops::Range<usize>, new: std::ops::Range<usize>) {
    let paired = old.len().min(new.len());
    for k in 0..paired {
        steps.push(Step::Pair(old.start + k, new.start + k));
    }
    steps.extend((old.start + paired..old.end).map(Step::Delete));
    steps.extend((new.start + paired..new.end).map(Step::Insert));
}
