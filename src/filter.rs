use crate::{maxima::LocalMaximum, Order};

/// Minimum distance a color must have to the avoided color.
const AVOID_DISTANCE: f64 = 0.5;

const ADAPTIVE_START_THRESHOLD: f64 = 0.1;
const ADAPTIVE_THRESHOLD_STEP: f64 = 0.05;
const ADAPTIVE_ROUNDS: usize = 10;

/// Remove the maxima that are too close to the given color.
pub(crate) fn filter_avoid(maxima: Vec<LocalMaximum>, (r, g, b): (u8, u8, u8)) -> Vec<LocalMaximum> {
    let avoid = (r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);

    maxima
        .into_iter()
        .filter(|maximum| maximum.distance_to(avoid) >= AVOID_DISTANCE)
        .collect()
}

/// Greedily keep the maxima that are at least `threshold` away from every maximum kept before them. The maxima are
/// expected to be sorted by hit count so the more frequent of two close colors wins.
pub(crate) fn filter_distinct(maxima: &[LocalMaximum], threshold: f64) -> Vec<LocalMaximum> {
    let mut distinct: Vec<LocalMaximum> = Vec::new();

    for maximum in maxima.iter().copied() {
        if distinct
            .iter()
            .all(|kept| maximum.distance_to(kept.color()) >= threshold)
        {
            distinct.push(maximum);
        }
    }

    distinct
}

/// Reduce the maxima to at most `count` entries, raising the distinctness threshold step by step for as long as more
/// than `count` maxima survive it.
pub(crate) fn filter_distinct_adaptive(maxima: Vec<LocalMaximum>, count: usize) -> Vec<LocalMaximum> {
    if maxima.len() <= count {
        return maxima;
    }

    let mut maxima = maxima;
    let mut threshold = ADAPTIVE_START_THRESHOLD;

    for _ in 0..ADAPTIVE_ROUNDS {
        let distinct = filter_distinct(&maxima, threshold);
        if distinct.len() <= count {
            break;
        }

        maxima = distinct;
        threshold += ADAPTIVE_THRESHOLD_STEP;
    }

    log::debug!("adaptive distinct threshold stopped at {:.2}", threshold);

    maxima.truncate(count);
    maxima
}

/// Reorder the maxima. The sort is stable so maxima with equal brightness keep their frequency order.
pub(crate) fn sort_by_order(maxima: &mut [LocalMaximum], order: Order) {
    match order {
        Order::Frequency => (),
        Order::Brightness => maxima.sort_by(|a, b| b.brightness().total_cmp(&a.brightness())),
        Order::Darkness => maxima.sort_by(|a, b| a.brightness().total_cmp(&b.brightness())),
    }
}
