use biomorph_core::{develop, develop_with, DevelopmentOptions, PhenotypeCache, Symmetry};
use biomorph_data::{Genotype, Mode};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn deepest() -> Genotype {
    Genotype::new(Mode::Basic, vec![-1, 3, -1, -1, 2, 2, 2, 3, 8]).unwrap()
}

fn bench_develop_depth_8(c: &mut Criterion) {
    let genotype = deepest();
    c.bench_function("develop_depth_8", |b| {
        b.iter(|| black_box(develop(black_box(&genotype))))
    });
}

fn bench_develop_full_mode(c: &mut Criterion) {
    let genotype = Genotype::new(
        Mode::Full,
        vec![-1, 3, -1, -1, 2, 2, 2, 3, 6, 4, 6, 2, -2],
    )
    .unwrap();
    let options = DevelopmentOptions {
        symmetry: Symmetry::FourWay,
        alternating_asymmetry: true,
        radial: true,
    };
    c.bench_function("develop_full_radial_four_way", |b| {
        b.iter(|| black_box(develop_with(black_box(&genotype), &options)))
    });
}

fn bench_cached_phenotype(c: &mut Criterion) {
    let genotype = deepest();
    let mut cache = PhenotypeCache::new(64);
    cache.phenotype(&genotype);
    c.bench_function("phenotype_cache_hit", |b| {
        b.iter(|| black_box(cache.phenotype(black_box(&genotype))))
    });
}

criterion_group!(
    benches,
    bench_develop_depth_8,
    bench_develop_full_mode,
    bench_cached_phenotype
);
criterion_main!(benches);
