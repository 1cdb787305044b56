use crate::models::{CurvePoint, CustomCurve};

/// Monotone piecewise cubic Hermite interpolant (Fritsch-Carlson slopes).
///
/// Never overshoots between samples, so a smoothed dimmer or pan curve stays
/// inside the range its source points span.
#[derive(Debug, Clone)]
pub struct Pchip {
    xs: Vec<f32>,
    ys: Vec<f32>,
    slopes: Vec<f32>,
}

impl Pchip {
    /// `None` when there are no usable points. Points are sorted by `t`;
    /// duplicate times keep the last value.
    pub fn new(points: &[CurvePoint]) -> Option<Self> {
        let mut sorted: Vec<CurvePoint> = points
            .iter()
            .filter(|p| p.t.is_finite() && p.value.is_finite())
            .copied()
            .collect();
        sorted.sort_by(|a, b| a.t.total_cmp(&b.t));

        let mut xs: Vec<f32> = Vec::with_capacity(sorted.len());
        let mut ys: Vec<f32> = Vec::with_capacity(sorted.len());
        for p in sorted {
            match xs.last() {
                Some(last) if (p.t - last).abs() < 1e-6 => {
                    if let Some(y) = ys.last_mut() {
                        *y = p.value;
                    }
                }
                _ => {
                    xs.push(p.t);
                    ys.push(p.value);
                }
            }
        }
        if xs.is_empty() {
            return None;
        }

        let slopes = fritsch_carlson_slopes(&xs, &ys);
        Some(Self { xs, ys, slopes })
    }

    pub fn eval(&self, x: f32) -> f32 {
        let n = self.xs.len();
        if n == 1 || x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }

        // Interval [xs[k], xs[k + 1]] containing x
        let k = self.xs.partition_point(|xi| *xi <= x).saturating_sub(1).min(n - 2);
        let h = self.xs[k + 1] - self.xs[k];
        let s = (x - self.xs[k]) / h;
        let s2 = s * s;
        let s3 = s2 * s;

        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;

        h00 * self.ys[k]
            + h10 * h * self.slopes[k]
            + h01 * self.ys[k + 1]
            + h11 * h * self.slopes[k + 1]
    }
}

fn fritsch_carlson_slopes(xs: &[f32], ys: &[f32]) -> Vec<f32> {
    let n = xs.len();
    if n < 2 {
        return vec![0.0; n];
    }

    let h: Vec<f32> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f32> = (0..n - 1).map(|k| (ys[k + 1] - ys[k]) / h[k]).collect();

    if n == 2 {
        return vec![delta[0], delta[0]];
    }

    let mut d = vec![0.0f32; n];
    for k in 1..n - 1 {
        if delta[k - 1] * delta[k] <= 0.0 {
            // local extremum or flat run
            d[k] = 0.0;
        } else {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            d[k] = (w1 + w2) / (w1 / delta[k - 1] + w2 / delta[k]);
        }
    }

    d[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

/// One-sided three-point end slope, limited to keep monotonicity.
fn end_slope(h0: f32, h1: f32, delta0: f32, delta1: f32) -> f32 {
    let d = ((2.0 * h0 + h1) * delta0 - h0 * delta1) / (h0 + h1);
    if d.signum() != delta0.signum() || delta0 == 0.0 {
        0.0
    } else if delta0.signum() != delta1.signum() && d.abs() > 3.0 * delta0.abs() {
        3.0 * delta0
    } else {
        d
    }
}

/// Resample a custom curve to `count` evenly spaced points on [0, 1].
///
/// The first and last output values equal the first and last input values.
pub fn smooth(curve: &CustomCurve, count: usize) -> Option<CustomCurve> {
    let count = count.max(2);
    let interp = Pchip::new(&curve.points)?;
    let first = interp.ys[0];
    let last = interp.ys[interp.ys.len() - 1];

    let points = (0..count)
        .map(|i| {
            let t = i as f32 / (count - 1) as f32;
            let value = if i == 0 {
                first
            } else if i == count - 1 {
                last
            } else {
                interp.eval(t)
            };
            CurvePoint::new(t, value)
        })
        .collect();
    Some(CustomCurve::new(points))
}
