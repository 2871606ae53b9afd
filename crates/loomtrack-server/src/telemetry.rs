// SPDX-License-Identifier: Apache-2.0

use crate::AppState;

fn percentile_ms(sorted_ns: &[u64], pct: f64) -> u64 {
    if sorted_ns.is_empty() {
        return 0;
    }
    let idx = ((sorted_ns.len() as f64) * pct).ceil() as usize;
    let idx = idx.saturating_sub(1).min(sorted_ns.len() - 1);
    sorted_ns[idx] / 1_000_000
}

pub(crate) async fn render_metrics(state: &AppState) -> String {
    let mut out = String::new();
    out.push_str("# TYPE loomtrack_requests_total counter\n");
    for ((route, status), count) in state.metrics.counts_snapshot().await {
        out.push_str(&format!(
            "loomtrack_requests_total{{route=\"{route}\",status=\"{status}\"}} {count}\n"
        ));
    }
    out.push_str("# TYPE loomtrack_request_latency_ms summary\n");
    for (route, mut samples) in state.metrics.latency_snapshot().await {
        samples.sort_unstable();
        let p50 = percentile_ms(&samples, 0.50);
        let p95 = percentile_ms(&samples, 0.95);
        out.push_str(&format!(
            "loomtrack_request_latency_ms{{route=\"{route}\",quantile=\"0.5\"}} {p50}\n"
        ));
        out.push_str(&format!(
            "loomtrack_request_latency_ms{{route=\"{route}\",quantile=\"0.95\"}} {p95}\n"
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::percentile_ms;

    #[test]
    fn percentile_handles_small_samples() {
        assert_eq!(percentile_ms(&[], 0.95), 0);
        assert_eq!(percentile_ms(&[5_000_000], 0.95), 5);
        let samples: Vec<u64> = (1..=100).map(|n| n * 1_000_000).collect();
        assert_eq!(percentile_ms(&samples, 0.50), 50);
        assert_eq!(percentile_ms(&samples, 0.95), 95);
    }
}
