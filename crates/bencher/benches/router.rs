use bencher::{TestCase, TestRequest, resource_endpoint, resource_router};
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

static FIRST: TestRequest = TestRequest::new("GET", "/resource0/42?tag=hot");
static LAST_SMALL: TestRequest = TestRequest::new("GET", "/resource3/42?tag=hot");
static LAST_NORMAL: TestRequest = TestRequest::new("GET", "/resource31/42?tag=hot");
static LAST_LARGE: TestRequest = TestRequest::new("GET", "/resource255/42?tag=hot");
static UNCLAIMED: TestRequest = TestRequest::new("GET", "/missing/42");

fn create_test_cases() -> Vec<TestCase> {
    vec![
        TestCase::small("small_first", FIRST),
        TestCase::small("small_last", LAST_SMALL),
        TestCase::normal("normal_first", FIRST),
        TestCase::normal("normal_last", LAST_NORMAL),
        TestCase::normal("normal_unclaimed", UNCLAIMED),
        TestCase::large("large_last", LAST_LARGE),
        TestCase::large("large_unclaimed", UNCLAIMED),
    ]
}

fn benchmark_route(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("route");

    for case in create_test_cases() {
        let router = resource_router(case.routes());
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            b.iter_batched(
                || case.request().to_request(),
                |request| {
                    let response = router.route(request).map(futures::executor::block_on);
                    black_box(response);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_url_for(criterion: &mut Criterion) {
    let endpoint = resource_endpoint(7);
    criterion.bench_function("url_for", |b| {
        b.iter(|| black_box(endpoint.url_for((black_box(42), Some("hot stuff".to_string())))));
    });
}

criterion_group!(router, benchmark_route, benchmark_url_for);
criterion_main!(router);
