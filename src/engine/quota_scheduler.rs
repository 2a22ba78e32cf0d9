// ==========================================
// 合同录入引擎 - 月度配额生成器
// ==========================================
// 规则: [start, end] 闭区间内每个自然月生成一条配额
// 逆序区间: 返回空序列，不报错
// 性质: 纯函数，同样输入总是得到同样的默认值序列
// ==========================================

use chrono::{Months, NaiveDate};

use crate::config::engine_config::QuotaDefaults;
use crate::domain::contract::{first_of_month, Quota};

/// 生成月度配额（默认值 tmh=330, tms=300, h2o=10）
pub fn generate_quotas(start_month: NaiveDate, end_month: NaiveDate) -> Vec<Quota> {
    generate_quotas_with(start_month, end_month, &QuotaDefaults::default())
}

/// 按给定默认值生成月度配额
pub fn generate_quotas_with(
    start_month: NaiveDate,
    end_month: NaiveDate,
    defaults: &QuotaDefaults,
) -> Vec<Quota> {
    let end = first_of_month(end_month);
    let mut cursor = first_of_month(start_month);
    let mut quotas = Vec::with_capacity(months_between_inclusive(cursor, end));

    while cursor <= end {
        quotas.push(Quota {
            month: cursor,
            tmh: defaults.tmh,
            tms: defaults.tms,
            h2o_percentage: defaults.h2o_percentage,
        });

        cursor = match cursor.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }

    quotas
}

/// 闭区间月份数（逆序为 0）
pub fn months_between_inclusive(start_month: NaiveDate, end_month: NaiveDate) -> usize {
    use chrono::Datelike;

    let start = start_month.year() as i64 * 12 + start_month.month0() as i64;
    let end = end_month.year() as i64 * 12 + end_month.month0() as i64;
    if end < start {
        0
    } else {
        (end - start + 1) as usize
    }
}

/// 配额月份是否恰好覆盖 [start, end]（逐月、升序、无缺漏）
///
/// 只比对月份，不比对数值，手工修改过的配额仍视为匹配
pub fn quotas_match_window(quotas: &[Quota], start_month: NaiveDate, end_month: NaiveDate) -> bool {
    let start = first_of_month(start_month);
    if quotas.len() != months_between_inclusive(start, end_month) {
        return false;
    }

    quotas
        .iter()
        .enumerate()
        .all(|(i, q)| start.checked_add_months(Months::new(i as u32)) == Some(q.month))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn ym(year: i32, month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, 1).unwrap()
    }

    #[test]
    fn test_generates_one_quota_per_month_inclusive() {
        let quotas = generate_quotas(ym(2026, 1), ym(2026, 6));
        assert_eq!(quotas.len(), 6);
        assert_eq!(quotas.first().unwrap().month, ym(2026, 1));
        assert_eq!(quotas.last().unwrap().month, ym(2026, 6));

        for q in &quotas {
            assert_eq!(q.tmh, 330.0);
            assert_eq!(q.tms, 300.0);
            assert_eq!(q.h2o_percentage, 10.0);
        }
    }

    #[test]
    fn test_months_strictly_increase_across_year_boundary() {
        let quotas = generate_quotas(ym(2025, 11), ym(2026, 2));
        let months: Vec<(i32, u32)> = quotas.iter().map(|q| (q.month.year(), q.month.month())).collect();
        assert_eq!(months, vec![(2025, 11), (2025, 12), (2026, 1), (2026, 2)]);
        assert_eq!(quotas.len(), months_between_inclusive(ym(2025, 11), ym(2026, 2)));
    }

    #[test]
    fn test_single_month_range() {
        let quotas = generate_quotas(ym(2026, 3), ym(2026, 3));
        assert_eq!(quotas.len(), 1);
    }

    #[test]
    fn test_reversed_range_is_empty() {
        assert!(generate_quotas(ym(2026, 5), ym(2026, 4)).is_empty());
        assert_eq!(months_between_inclusive(ym(2026, 5), ym(2026, 4)), 0);
    }

    #[test]
    fn test_idempotent() {
        let a = generate_quotas(ym(2026, 1), ym(2027, 12));
        let b = generate_quotas(ym(2026, 1), ym(2027, 12));
        assert_eq!(a, b);
        assert_eq!(a.len(), 24);
    }

    #[test]
    fn test_mid_month_inputs_are_normalised() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let quotas = generate_quotas(start, end);
        assert_eq!(quotas.len(), 3);
        assert_eq!(quotas[1].month, ym(2026, 2));
    }

    #[test]
    fn test_custom_defaults() {
        let defaults = QuotaDefaults {
            tmh: 1100.0,
            tms: 1000.0,
            h2o_percentage: 9.0,
        };
        let quotas = generate_quotas_with(ym(2026, 1), ym(2026, 2), &defaults);
        assert!(quotas.iter().all(|q| q.tmh == 1100.0 && q.tms == 1000.0 && q.h2o_percentage == 9.0));
    }

    #[test]
    fn test_quotas_match_window() {
        let quotas = generate_quotas(ym(2026, 1), ym(2026, 3));
        assert!(quotas_match_window(&quotas, ym(2026, 1), ym(2026, 3)));
        assert!(!quotas_match_window(&quotas, ym(2026, 1), ym(2026, 4)));
        assert!(!quotas_match_window(&quotas[1..], ym(2026, 1), ym(2026, 3)));
        assert!(!quotas_match_window(&quotas, ym(2026, 3), ym(2026, 1)));

        let mut edited = quotas.clone();
        edited[0].tmh = 999.0;
        assert!(quotas_match_window(&edited, ym(2026, 1), ym(2026, 3)));

        let mut shuffled = quotas;
        shuffled.swap(0, 2);
        assert!(!quotas_match_window(&shuffled, ym(2026, 1), ym(2026, 3)));
    }
}
