use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use resscan::config::{PathMarks, ScanConfig};
use resscan::items::{Item, ItemIndex, PropertyValue};
use resscan::rules::model::{
    MatchLogic, NameMatchMode, PathMatchMode, PredicateGroup, PropertyGroup, PropertyMatchRule,
    PropertyRuleItem, Rule, RuleItem,
};
use resscan::rules::operators::{OperatorChain, PreparedRule};
use resscan::rules::plugins::Plugins;
use resscan::rules::ScanEngine;

fn items(count: usize) -> Vec<Item> {
    (0..count)
        .map(|i| {
            let folder = ["Characters", "Props", "UI", "Developers/bob"][i % 4];
            let prefix = ["SK_", "SM_", "T_", "M_"][i % 4];
            Item::new(format!("/Game/{}/{}Asset{}", folder, prefix, i), "Texture2D")
                .with_property("MaxTextureSize", PropertyValue::Float((i % 8 * 512) as f64))
                .with_property("LODGroup", PropertyValue::Text("TEXTUREGROUP_World".to_string()))
        })
        .collect()
}

fn texture_rule() -> Rule {
    Rule::new("Oversized textures")
        .with_scan_filter("/Game")
        .with_name_group(PredicateGroup::necessary(
            NameMatchMode::Wildcard,
            vec![RuleItem::new("t_*asset*")],
        ))
        .with_path_group(PredicateGroup::necessary(
            PathMatchMode::WithIn,
            vec![RuleItem::reversed("/Game/Developers")],
        ))
        .with_property_group(PropertyGroup {
            match_logic: MatchLogic::Optional,
            optional_match_num: 1,
            rules: vec![
                PropertyRuleItem::new("MaxTextureSize", "2048", PropertyMatchRule::Equal),
                PropertyRuleItem::new("LODGroup", "TEXTUREGROUP_UI", PropertyMatchRule::Equal),
            ],
            reverse_check: false,
        })
}

fn bench_operator_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("operator_chain");
    let chain = OperatorChain::default();
    let prepared = PreparedRule::prepare(
        texture_rule(),
        0,
        &Plugins::with_builtins(),
        &PathMarks::for_project("/work/game", None),
    );

    for count in [100usize, 1_000, 10_000] {
        let items = items(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &items, |b, items| {
            b.iter(|| {
                items
                    .iter()
                    .filter(|item| chain.matches(black_box(item), &prepared))
                    .count()
            })
        });
    }
    group.finish();
}

fn bench_engine_scan(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("engine_scan");

    for count in [1_000usize, 10_000] {
        let mut config = ScanConfig::default();
        config.rules.push(texture_rule());
        config.rules.push(Rule::new("SK prefix").with_scan_filter("/Game").with_name_group(
            PredicateGroup::necessary(NameMatchMode::StartWith, vec![RuleItem::new("SK_")]),
        ));
        let engine = ScanEngine::new(config, Arc::new(ItemIndex::from_items(items(count))));

        group.bench_function(BenchmarkId::from_parameter(count), |b| {
            b.iter(|| runtime.block_on(engine.run()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_operator_chain, bench_engine_scan);
criterion_main!(benches);
