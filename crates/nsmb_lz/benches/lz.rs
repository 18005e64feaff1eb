use divan::AllocProfiler;

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

fn get_input() -> Vec<u8> {
    (0..0x10000u32)
        .map(|i| match i % 20 {
            0..=3 => (i / 20) as u8,
            4..=9 => (i % 7) as u8,
            _ => 0,
        })
        .collect()
}

pub mod lz77 {
    use divan::Bencher;

    #[divan::bench]
    fn compress(bencher: Bencher) {
        bencher.with_inputs(super::get_input).bench_refs(|data| {
            divan::black_box(nsmb_lz::compress(data).unwrap());
        });
    }

    #[divan::bench]
    fn decompress(bencher: Bencher) {
        bencher
            .with_inputs(|| nsmb_lz::compress(&super::get_input()).unwrap())
            .bench_refs(|data| {
                divan::black_box(nsmb_lz::decompress(data).unwrap());
            });
    }
}

pub mod lh {
    use divan::Bencher;

    fn get_input() -> Vec<u8> {
        std::fs::read(format!(
            "{}/resources/worlds.lh",
            env!("CARGO_MANIFEST_DIR")
        ))
        .unwrap()
    }

    #[divan::bench]
    fn decompress(bencher: Bencher) {
        bencher.with_inputs(get_input).bench_refs(|data| {
            divan::black_box(nsmb_lz::decompress(data).unwrap());
        });
    }
}
