use std::collections::BTreeSet;

const TOKEN_SCALE: f64 = 0.95;

pub fn ratio(left: &str, right: &str) -> f64 {
    let left = left.chars().collect::<Vec<_>>();
    let right = right.chars().collect::<Vec<_>>();
    indel_ratio(&left, &right)
}

fn indel_ratio(left: &[char], right: &[char]) -> f64 {
    let total = left.len() + right.len();
    if total == 0 {
        return 100.0;
    }
    let lcs = longest_common_subsequence(left, right);
    200.0 * lcs as f64 / total as f64
}

fn longest_common_subsequence(left: &[char], right: &[char]) -> usize {
    if left.is_empty() || right.is_empty() {
        return 0;
    }

    let mut previous = vec![0_usize; right.len() + 1];
    let mut current = vec![0_usize; right.len() + 1];
    for &l in left {
        for (index, &r) in right.iter().enumerate() {
            current[index + 1] = if l == r {
                previous[index] + 1
            } else {
                current[index].max(previous[index + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[right.len()]
}

pub fn partial_ratio(left: &str, right: &str) -> f64 {
    let left = left.chars().collect::<Vec<_>>();
    let right = right.chars().collect::<Vec<_>>();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let (shorter, longer) = if left.len() <= right.len() {
        (&left, &right)
    } else {
        (&right, &left)
    };

    let window = shorter.len();
    let mut best = 0.0_f64;
    for start in 0..=longer.len() - window {
        let score = indel_ratio(shorter, &longer[start..start + window]);
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

fn sorted_tokens(text: &str) -> Vec<&str> {
    let mut tokens = text.split_whitespace().collect::<Vec<_>>();
    tokens.sort_unstable();
    tokens
}

pub fn token_sort_ratio(left: &str, right: &str) -> f64 {
    ratio(&sorted_tokens(left).join(" "), &sorted_tokens(right).join(" "))
}

fn partial_token_sort_ratio(left: &str, right: &str) -> f64 {
    partial_ratio(&sorted_tokens(left).join(" "), &sorted_tokens(right).join(" "))
}

pub fn token_set_ratio(left: &str, right: &str) -> f64 {
    let left_tokens = left.split_whitespace().collect::<BTreeSet<_>>();
    let right_tokens = right.split_whitespace().collect::<BTreeSet<_>>();
    if left_tokens.is_empty() || right_tokens.is_empty() {
        return 0.0;
    }

    let shared = left_tokens
        .intersection(&right_tokens)
        .copied()
        .collect::<Vec<_>>();
    let left_only = left_tokens
        .difference(&right_tokens)
        .copied()
        .collect::<Vec<_>>();
    let right_only = right_tokens
        .difference(&left_tokens)
        .copied()
        .collect::<Vec<_>>();

    if !shared.is_empty() && (left_only.is_empty() || right_only.is_empty()) {
        return 100.0;
    }

    let left_rest = left_only.join(" ").chars().collect::<Vec<_>>();
    let right_rest = right_only.join(" ").chars().collect::<Vec<_>>();
    let shared_len = char_len(&shared.join(" "));
    let separator = usize::from(shared_len > 0);

    // Rest distances are normalized over the full "shared + separator + rest" lengths.
    let left_len = shared_len + separator + left_rest.len();
    let right_len = shared_len + separator + right_rest.len();
    let rest_distance =
        left_rest.len() + right_rest.len() - 2 * longest_common_subsequence(&left_rest, &right_rest);
    let mut best = 100.0 - 100.0 * rest_distance as f64 / (left_len + right_len) as f64;
    if shared_len == 0 {
        return best;
    }

    for (rest_len, combined_len) in [(left_rest.len(), left_len), (right_rest.len(), right_len)] {
        let distance = 1 + rest_len;
        let score = 100.0 - 100.0 * distance as f64 / (shared_len + combined_len) as f64;
        best = best.max(score);
    }
    best
}

fn partial_token_set_ratio(left: &str, right: &str) -> f64 {
    let left_tokens = left.split_whitespace().collect::<BTreeSet<_>>();
    let right_tokens = right.split_whitespace().collect::<BTreeSet<_>>();
    if left_tokens.is_empty() || right_tokens.is_empty() {
        return 0.0;
    }
    if left_tokens.intersection(&right_tokens).next().is_some() {
        return 100.0;
    }
    let left_rest = left_tokens.into_iter().collect::<Vec<_>>().join(" ");
    let right_rest = right_tokens.into_iter().collect::<Vec<_>>().join(" ");
    partial_ratio(&left_rest, &right_rest)
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn weighted_ratio(left: &str, right: &str) -> f64 {
    let left_len = char_len(left);
    let right_len = char_len(right);
    if left_len == 0 || right_len == 0 {
        return 0.0;
    }

    let length_ratio = left_len.max(right_len) as f64 / left_len.min(right_len) as f64;
    let mut best = ratio(left, right);

    if length_ratio < 1.5 {
        let token_score = token_sort_ratio(left, right).max(token_set_ratio(left, right));
        return best.max(token_score * TOKEN_SCALE);
    }

    let partial_scale = if length_ratio < 8.0 { 0.9 } else { 0.6 };
    best = best.max(partial_ratio(left, right) * partial_scale);

    let partial_token_score =
        partial_token_sort_ratio(left, right).max(partial_token_set_ratio(left, right));
    best.max(partial_token_score * TOKEN_SCALE * partial_scale)
}
