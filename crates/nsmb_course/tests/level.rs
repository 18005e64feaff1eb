use nsmb_course::error::Result;
use nsmb_course::types::{Entrance, Sprite, Zone};
use nsmb_course::{load_layer, save_layer, Area, Level, LevelObject};
use pretty_assertions::assert_eq;
use tracing::info;
use tracing_test::traced_test;

fn build_level() -> Result<Level> {
    let mut first = Area::new();
    first.records.tilesets.names = [
        "Pa0_jyotyu".to_string(),
        "Pa1_nohara".to_string(),
        String::new(),
        String::new(),
    ];
    first.records.zones = vec![Zone {
        width: 0x400,
        height: 0x200,
        ..Default::default()
    }];
    first.records.sprites = vec![Sprite {
        kind: 20,
        x: 0x40,
        y: 0x40,
        ..Default::default()
    }];
    first.records.entrances = vec![Entrance {
        x: 0x20,
        y: 0x100,
        ..Default::default()
    }];
    first.records.metadata.set_string("Title", "Grassland")?;
    first.layers[0].push(LevelObject::new(0, 0, 0, 24, 64, 3));
    first.layers[1].push(LevelObject::new(1, 12, 10, 20, 1, 1));

    let mut second = Area::new();
    second.records.options.time_limit = 200;
    second.layers[2].push(LevelObject::new(0, 2, 0, 0, 4, 4));

    Ok(Level {
        areas: vec![first, second],
        ..Default::default()
    })
}

#[traced_test]
#[test]
fn level_roundtrip() -> Result<()> {
    let level = build_level()?;
    let bytes = level.to_bytes(true)?;
    info!("compressed level is {} bytes", bytes.len());

    let read = Level::from_bytes(&bytes)?;
    assert_eq!(read, level);
    assert_eq!(read.to_bytes(true)?, bytes);

    Ok(())
}

#[test]
fn layer_depths() -> Result<()> {
    let mut objects = Vec::new();
    for i in 0..3u16 {
        objects.extend_from_slice(&[0x00, i as u8, 0x00, 0x01, 0x00, 0x02, 0x00, 0x01, 0x00, 0x01]);
    }
    objects.extend_from_slice(&[0xFF, 0xFF]);

    let layer = load_layer(0, Some(&objects))?;
    let depths: Vec<u32> = layer.iter().map(|object| object.z).collect();
    assert_eq!(depths, vec![16384, 16385, 16386]);
    assert_eq!(save_layer(&layer), objects);

    let depths: Vec<u32> = load_layer(2, Some(&objects))?
        .iter()
        .map(|object| object.z)
        .collect();
    assert_eq!(depths, vec![0, 1, 2]);

    Ok(())
}

#[test]
fn level_as_json() -> Result<()> {
    let level = build_level()?;
    let json = serde_json::to_value(&level).map_err(std::io::Error::from)?;

    assert_eq!(json["variant"], "Nsmbw");
    assert_eq!(json["areas"][0]["records"]["tilesets"]["names"][0], "Pa0_jyotyu");
    assert_eq!(json["areas"][1]["records"]["options"]["time_limit"], 200);
    assert_eq!(json["areas"][0]["layers"][1]["objects"][0]["kind"], 12);

    Ok(())
}
