/// Longest common subsequence of two sequences under `same`.
///
/// Returns the aligned index pairs in increasing order. When several
/// subsequences have the maximal length, the one matching earliest elements
/// of `left` is preferred, so the result only depends on the inputs.
pub fn longest_common_subseq<L, R>(
    left: &[L],
    right: &[R],
    mut same: impl FnMut(&L, &R) -> bool,
) -> Vec<(usize, usize)> {
    let (n, m) = (left.len(), right.len());
    if n == 0 || m == 0 {
        return Vec::new();
    }

    // lengths[i][j] = LCS length of left[i..] and right[j..]
    let width = m + 1;
    let mut lengths = vec![0usize; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[i * width + j] = if same(&left[i], &right[j]) {
                lengths[(i + 1) * width + j + 1] + 1
            } else {
                lengths[(i + 1) * width + j].max(lengths[i * width + j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(lengths[0]);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        let here = lengths[i * width + j];
        if here == 0 {
            break;
        }
        if lengths[(i + 1) * width + j + 1] + 1 == here && same(&left[i], &right[j]) {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if lengths[i * width + j + 1] == here {
            j += 1;
        } else {
            i += 1;
        }
    }
    pairs
}
