use anyhow::Result;
use chrono::NaiveDate;
use futures::executor::block_on;
use store_report_builder::*;

fn metric_row(store: &str, fields: &[(&str, RawValue)]) -> RawRecord {
    let mut row = RawRecord::new();
    row.insert("门店名称", store);
    for (name, value) in fields {
        row.insert(*name, value.clone());
    }
    row
}

fn product_row(store: &str, name: &str, amount: f64, count: i64, rate: &str) -> RawRecord {
    let mut row = RawRecord::new();
    row.insert("核销门店", store);
    row.insert("商品名称", RawValue::tagged(name));
    row.insert("实付总金额", amount);
    row.insert("核销次数", count);
    row.insert("转化率", RawValue::tagged(rate));
    row
}

fn weekly_source(store: &str, reference: NaiveDate) -> TableSource {
    let (current, previous) = comparison_windows(AnalysisKind::Weekly, reference);

    let mut source = TableSource::new("周数据导出");
    source.add_metrics(
        current,
        RecordTable::new(vec![metric_row(
            store,
            &[
                ("门店页访问次数", RawValue::Integer(1523)),
                ("门店页访问人数", RawValue::Integer(980)),
                ("门店意向成交人数", RawValue::Integer(0)),
                ("门店评分", RawValue::Number(4.6)),
                ("经营风险差评率", RawValue::Number(0.03)),
                ("评价回复率", RawValue::Number(0.98)),
                ("门店核销金额", RawValue::Text("12,340.5".to_string())),
                ("上榜榜单及排名", RawValue::tagged("同城网吧人气榜第3名")),
            ],
        )]),
    );
    source.add_metrics(
        previous,
        RecordTable::new(vec![metric_row(
            store,
            &[
                ("门店页访问次数", RawValue::Integer(1805)),
                ("门店页访问人数", RawValue::Integer(1100)),
                ("门店意向成交人数", RawValue::Integer(0)),
                ("门店评分", RawValue::Number(4.6)),
                ("经营风险差评率", RawValue::Number(0.01)),
                ("评价回复率", RawValue::Number(0.95)),
                ("门店核销金额", RawValue::Text("11,800".to_string())),
                ("上榜榜单及排名", RawValue::tagged("同城网吧人气榜第5名")),
            ],
        )]),
    );
    source.add_products(
        current,
        RecordTable::new(vec![
            product_row(store, "通宵畅玩套餐", 4980.0, 24, "8.5%"),
            product_row(store, "下午茶电竞套餐", 1200.0, 10, "4.2%"),
            product_row(store, "通宵畅玩套餐", 830.0, 4, "9.0%"),
            product_row(store, "新客体验券", 99.0, 18, "12.0%"),
        ]),
    );
    source.add_products(
        previous,
        RecordTable::new(vec![product_row(store, "通宵畅玩套餐", 5200.0, 30, "8.0%")]),
    );
    source
}

#[test]
fn test_comprehensive_weekly_report() -> Result<()> {
    let store = "竞潮玩电竞馆(春熙路店)";
    let reference = NaiveDate::from_ymd_opt(2025, 11, 5).unwrap();
    let source = weekly_source(store, reference);

    let report = block_on(generate_store_report(
        &source,
        store,
        AnalysisKind::Weekly,
        reference,
    ))?;

    let metrics = report.document.sheet("数据分析").expect("metrics sheet");

    // Title banner and weekly headers.
    assert_eq!(
        metrics.cell(1, 1).unwrap().value.to_string(),
        format!("{} 经营数据分析报告", store)
    );
    assert_eq!(metrics.cell(2, 3).unwrap().value.to_string(), "本周数值");
    assert_eq!(metrics.cell(2, 4).unwrap().value.to_string(), "上周数值");

    // 门店曝光量 declined: value carries the down arrow and the red fill.
    let change_cell = metrics.cell(3, 5).unwrap();
    assert!(change_cell.value.to_string().starts_with('↓'));
    assert_eq!(change_cell.style.fill_color.as_deref(), Some("FFFFC7CE"));

    // 评价回复率 is a fraction rendered as a percentage, and it grew.
    let rows: Vec<u32> = (3..30).collect();
    let reply_row = rows
        .iter()
        .copied()
        .find(|r| {
            metrics
                .cell(*r, 2)
                .is_some_and(|c| c.value.to_string() == "评价回复率")
        })
        .expect("评价回复率 row");
    assert_eq!(metrics.cell(reply_row, 3).unwrap().value.to_string(), "98.00%");
    assert_eq!(metrics.cell(reply_row, 4).unwrap().value.to_string(), "95.00%");
    assert!(metrics
        .cell(reply_row, 5)
        .unwrap()
        .value
        .to_string()
        .starts_with('↑'));

    // Localized amount string was parsed, so the change is numeric.
    let amount_row = rows
        .iter()
        .copied()
        .find(|r| {
            metrics
                .cell(*r, 2)
                .is_some_and(|c| c.value.to_string() == "核销金额（元）")
        })
        .expect("核销金额 row");
    assert_eq!(metrics.cell(amount_row, 3).unwrap().value.to_string(), "12340.5");
    assert!(metrics
        .cell(amount_row, 5)
        .unwrap()
        .value
        .to_string()
        .starts_with('↑'));

    // Rank text passes through and is not comparable.
    let rank_row = rows
        .iter()
        .copied()
        .find(|r| {
            metrics
                .cell(*r, 2)
                .is_some_and(|c| c.value.to_string() == "同城网吧人气榜排名")
        })
        .expect("rank row");
    assert_eq!(
        metrics.cell(rank_row, 3).unwrap().value.to_string(),
        "同城网吧人气榜第3名"
    );
    assert_eq!(metrics.cell(rank_row, 5).unwrap().value.to_string(), "N/A");

    // Zero baseline with zero current also reads N/A.
    let deal_row = rows
        .iter()
        .copied()
        .find(|r| {
            metrics
                .cell(*r, 2)
                .is_some_and(|c| c.value.to_string() == "门店页成交人数")
        })
        .expect("deal row");
    assert_eq!(metrics.cell(deal_row, 5).unwrap().value.to_string(), "N/A");

    // Unfetched fields degrade to the missing marker, never an error.
    let missing_row = rows
        .iter()
        .copied()
        .find(|r| {
            metrics
                .cell(*r, 2)
                .is_some_and(|c| c.value.to_string() == "视频条数")
        })
        .expect("video row");
    assert_eq!(metrics.cell(missing_row, 3).unwrap().value.to_string(), "数据缺失");

    Ok(())
}

#[test]
fn test_product_tables_aggregate_sort_and_color() -> Result<()> {
    let store = "竞潮玩电竞馆(春熙路店)";
    let reference = NaiveDate::from_ymd_opt(2025, 11, 5).unwrap();
    let source = weekly_source(store, reference);

    let report = block_on(generate_store_report(
        &source,
        store,
        AnalysisKind::Weekly,
        reference,
    ))?;
    let products = report.document.sheet("套餐分析").expect("products sheet");

    assert_eq!(products.cell(2, 1).unwrap().value.to_string(), "本周套餐");
    assert_eq!(products.cell(2, 5).unwrap().value.to_string(), "上周套餐");

    // 通宵畅玩套餐 aggregated across two records, first-seen rate kept,
    // amount-descending order puts it first.
    assert_eq!(products.cell(4, 1).unwrap().value.to_string(), "通宵畅玩套餐");
    assert_eq!(products.cell(4, 2).unwrap().value.to_string(), "5810");
    assert_eq!(products.cell(4, 3).unwrap().value.to_string(), "28");
    assert_eq!(products.cell(4, 4).unwrap().value.to_string(), "8.5%");
    // 28 redemptions lands in the high tier.
    assert_eq!(products.cell(4, 1).unwrap().style.fill_color.as_deref(), Some("F0FFF0"));

    // 下午茶电竞套餐: count 10 is still the low tier.
    let tea_row = (4..10)
        .find(|r| {
            products
                .cell(*r, 1)
                .is_some_and(|c| c.value.to_string() == "下午茶电竞套餐")
        })
        .expect("tea row");
    assert_eq!(
        products.cell(tea_row, 1).unwrap().style.fill_color.as_deref(),
        Some("FFC0CB")
    );

    // 新客体验券: count 18 is the medium tier.
    let coupon_row = (4..10)
        .find(|r| {
            products
                .cell(*r, 1)
                .is_some_and(|c| c.value.to_string() == "新客体验券")
        })
        .expect("coupon row");
    assert_eq!(
        products.cell(coupon_row, 1).unwrap().style.fill_color.as_deref(),
        Some("E0FFFF")
    );

    // Previous-period table renders in the right-hand block.
    assert_eq!(products.cell(4, 5).unwrap().value.to_string(), "通宵畅玩套餐");
    assert_eq!(products.cell(4, 7).unwrap().value.to_string(), "30");

    Ok(())
}

#[test]
fn test_sort_by_count_reorders_tables() -> Result<()> {
    let store = "竞潮玩电竞馆(春熙路店)";
    let reference = NaiveDate::from_ymd_opt(2025, 11, 5).unwrap();
    let source = weekly_source(store, reference);

    let builder = ReportBuilder::new().with_sort_key(SortKey::Count);
    let report = block_on(builder.generate(&source, store, reference, None))?;
    let products = report.document.sheet("套餐分析").expect("products sheet");

    // Count-descending: 通宵畅玩套餐 (28), 新客体验券 (18), 下午茶电竞套餐 (10).
    assert_eq!(products.cell(4, 1).unwrap().value.to_string(), "通宵畅玩套餐");
    assert_eq!(products.cell(5, 1).unwrap().value.to_string(), "新客体验券");
    assert_eq!(products.cell(6, 1).unwrap().value.to_string(), "下午茶电竞套餐");
    Ok(())
}

#[test]
fn test_report_is_deterministic_and_round_trips() -> Result<()> {
    let store = "竞潮玩电竞馆(春熙路店)";
    let reference = NaiveDate::from_ymd_opt(2025, 11, 5).unwrap();
    let source = weekly_source(store, reference);

    let first = block_on(generate_store_report(&source, store, AnalysisKind::Weekly, reference))?;
    let second = block_on(generate_store_report(&source, store, AnalysisKind::Weekly, reference))?;

    assert_eq!(first.document, second.document);
    assert_eq!(first.document.to_text(), second.document.to_text());
    assert_eq!(first.filename, second.filename);
    assert_eq!(first.filename, "竞潮玩电竞馆_春熙路店__分析报告_20251105.json");

    // The emitted JSON reloads into an identical document.
    let path = std::env::temp_dir().join(&first.filename);
    first.document.write_json(std::fs::File::create(&path)?)?;
    let restored: Document = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(restored, first.document);
    std::fs::remove_file(&path).ok();

    Ok(())
}

#[test]
fn test_commentary_lands_in_fixed_region() -> Result<()> {
    let store = "竞潮玩电竞馆(春熙路店)";
    let reference = NaiveDate::from_ymd_opt(2025, 11, 5).unwrap();
    let source = weekly_source(store, reference);

    let commentary = Commentary {
        problem_analysis: "到店客流回落，核销转化承压。".to_string(),
        improvement_suggestion: "加大高峰时段活动曝光，提升新客留存。".to_string(),
    };

    let builder = ReportBuilder::new();
    let report = block_on(builder.generate(&source, store, reference, Some(&commentary)))?;

    let metrics = report.document.sheet("数据分析").expect("metrics sheet");
    let region = metrics.cell(3, 6).expect("commentary cell");
    let text = region.value.to_string();
    assert!(text.contains("【问题分析】"));
    assert!(text.contains("到店客流回落，核销转化承压。"));
    assert!(text.contains("【改进建议】"));
    assert!(region.style.wrap_text);
    Ok(())
}

#[test]
fn test_catalog_loaded_from_file() -> Result<()> {
    let path = std::env::temp_dir().join("store_report_catalog_test.json");
    let catalog_json = r#"{
        "metrics": [
            {"display_name": "门店曝光量", "source_field": "门店页访问次数"},
            {"display_name": "差评率", "source_field": "经营风险差评率", "is_percentage": true}
        ]
    }"#;
    std::fs::write(&path, catalog_json)?;

    let catalog = MetricCatalog::from_json_file(&path)?;
    std::fs::remove_file(&path).ok();
    assert_eq!(catalog.len(), 2);

    let store = "竞潮玩电竞馆(春熙路店)";
    let reference = NaiveDate::from_ymd_opt(2025, 11, 5).unwrap();
    let source = weekly_source(store, reference);

    let builder = ReportBuilder::new().with_catalog(catalog);
    let report = block_on(builder.generate(&source, store, reference, None))?;

    let metrics = report.document.sheet("数据分析").expect("metrics sheet");
    assert_eq!(metrics.cell(3, 2).unwrap().value.to_string(), "门店曝光量");
    assert_eq!(metrics.cell(4, 2).unwrap().value.to_string(), "差评率");
    assert_eq!(metrics.cell(4, 3).unwrap().value.to_string(), "3.00%");
    assert!(metrics.cell(5, 2).is_none());
    Ok(())
}
