//! End-to-end checks: zip archive and lookup on disk, through loading,
//! caching, the filter cascade and the map layer.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use incendios::data::{
    filter, load, Choice, DataSourceError, DatasetCache, FilterParams, Level, LoadOptions,
    MapLayer, Severity,
};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

const INCIDENTS: &str = "\
fecha,idcomunidad,idprovincia,municipio,superficie,gastos,perdidas,lat,lng,idcausa,causa_desc
2020-07-01,1,10,A,5,100,,40.0,-3.0,1,Rayo
2020-08-01,1,11,B,60,,,41.0,-4.0,2,
2021-07-01,2,20,C,12.5,50,10,,,7,
not-a-date,1,10,A,1,,,,,1,
2021-03-15,3,10,D,\"1,5\",0,0,42.0,-5.0,1,
";

const LOOKUP: &str = "\
idcomunidad,comunidad,idprovincia,provincia,idcausa,causa
1,Galicia,10,Lugo,1,Rayo
2,Asturias,11,Ourense,2,Negligencia
,,20,Oviedo,,
";

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
    let mut zip = zip::ZipWriter::new(std::fs::File::create(path)?);
    for (name, data) in entries {
        zip.start_file(*name, SimpleFileOptions::default())?;
        zip.write_all(data)?;
    }
    zip.finish()?;
    Ok(())
}

struct Fixture {
    _dir: TempDir,
    archive: PathBuf,
    lookup: PathBuf,
}

fn fixture() -> Result<Fixture> {
    let dir = TempDir::new()?;
    let archive = dir.path().join("fires-all.csv.zip");
    write_zip(
        &archive,
        &[
            ("__MACOSX/._fires-all.csv", b"\x00\x05\x16\x07".as_slice()),
            ("fires-all.csv", INCIDENTS.as_bytes()),
        ],
    )?;
    let lookup = dir.path().join("lookup.csv");
    std::fs::write(&lookup, LOOKUP)?;
    Ok(Fixture {
        _dir: dir,
        archive,
        lookup,
    })
}

#[test]
fn loads_and_resolves_names() -> Result<()> {
    let fx = fixture()?;
    let table = load(&fx.archive, Some(fx.lookup.as_path()), &LoadOptions::default())?;

    // The undated row is dropped, the metadata entry ignored.
    assert_eq!(table.len(), 4);
    assert_eq!(table.entry_name, "fires-all.csv");
    assert_eq!(table.years(), &[2020, 2021]);
    assert!(table.has_causes());

    let regions: Vec<&str> = table.incidents().iter().map(|i| i.region.as_str()).collect();
    assert!(regions.contains(&"Galicia"));
    assert!(regions.contains(&"Asturias"));
    // Region 3 is absent from a non-empty mapping.
    assert!(regions.contains(&"Unknown"));

    let oviedo = table
        .incidents()
        .iter()
        .find(|i| i.municipality == "C")
        .expect("row C loaded");
    assert_eq!(oviedo.province, "Oviedo");
    assert_eq!(oviedo.cause.as_deref(), Some("Unspecified"));
    assert_eq!(oviedo.coordinates(), None);

    let decimal_comma = table
        .incidents()
        .iter()
        .find(|i| i.municipality == "D")
        .expect("row D loaded");
    assert_eq!(decimal_comma.burned_area, Some(1.5));
    Ok(())
}

#[test]
fn full_range_aggregates() -> Result<()> {
    let fx = fixture()?;
    let table = load(&fx.archive, Some(fx.lookup.as_path()), &LoadOptions::default())?;
    let view = filter(&table, &FilterParams::full_range(&table));

    let agg = &view.aggregates;
    assert_eq!(agg.count, 4);
    assert_eq!(agg.burned_area, 79.0);
    assert_eq!(agg.suppression_cost, 150.0);
    assert_eq!(agg.economic_loss, 10.0);
    assert_eq!(agg.yearly, vec![(2020, 65.0), (2021, 14.0)]);
    assert_eq!(
        agg.causes,
        vec![
            ("Rayo".to_string(), 2),
            ("Negligencia".to_string(), 1),
            ("Unspecified".to_string(), 1),
        ]
    );
    assert_eq!(view.region_options, vec!["Asturias", "Galicia", "Unknown"]);
    assert_eq!(view.province_options, vec!["Lugo", "Ourense", "Oviedo"]);
    Ok(())
}

#[test]
fn cascade_narrows_options() -> Result<()> {
    let fx = fixture()?;
    let table = load(&fx.archive, Some(fx.lookup.as_path()), &LoadOptions::default())?;

    let mut params = FilterParams::full_range(&table);
    params.select(Level::Region, Choice::only("Galicia"));
    let view = filter(&table, &params);
    assert_eq!(view.aggregates.count, 2);
    assert_eq!(view.province_options, vec!["Lugo", "Ourense"]);
    assert_eq!(view.municipality_options, vec!["A", "B"]);
    // Region options stay those of the year range.
    assert_eq!(view.region_options.len(), 3);

    params.select(Level::Province, Choice::only("Ourense"));
    let view = filter(&table, &params);
    assert_eq!(view.aggregates.count, 1);
    assert_eq!(view.municipality_options, vec!["B"]);
    assert_eq!(view.aggregates.burned_area, 60.0);

    params.years = (2021, 2021);
    let view = filter(&table, &params);
    assert_eq!(view.aggregates.count, 0);
    assert!(!view.region_options.contains(&"Galicia".to_string()));
    Ok(())
}

#[test]
fn map_layer_tiers_and_zoom() -> Result<()> {
    let fx = fixture()?;
    let table = load(&fx.archive, Some(fx.lookup.as_path()), &LoadOptions::default())?;

    let view = filter(&table, &FilterParams::full_range(&table));
    let layer = MapLayer::build(&view, 2000);
    assert_eq!(layer.eligible, 3);
    assert_eq!(layer.points.len(), 3);
    assert_eq!(layer.zoom_hint, 6);
    assert!(!layer.is_sampled());
    let severe = layer
        .points
        .iter()
        .filter(|p| p.severity == Severity::Severe)
        .count();
    assert_eq!(severe, 1);

    let mut params = FilterParams::full_range(&table);
    params.select(Level::Region, Choice::only("Galicia"));
    let layer = MapLayer::build(&filter(&table, &params), 1);
    assert_eq!(layer.zoom_hint, 9);
    assert_eq!(layer.points.len(), 1);
    assert!(layer.is_sampled());
    Ok(())
}

#[test]
fn without_lookup_codes_pass_through() -> Result<()> {
    let fx = fixture()?;
    let table = load(&fx.archive, None, &LoadOptions::default())?;
    let view = filter(&table, &FilterParams::full_range(&table));
    assert_eq!(view.region_options, vec!["1", "2", "3"]);
    // No cause mapping: the descriptive text column is used.
    assert!(view
        .aggregates
        .causes
        .iter()
        .any(|(cause, n)| cause == "Rayo" && *n == 1));
    Ok(())
}

#[test]
fn unreadable_lookup_does_not_abort() -> Result<()> {
    let fx = fixture()?;
    let missing = fx.archive.with_file_name("nope.xlsx");
    let table = load(&fx.archive, Some(missing.as_path()), &LoadOptions::default())?;
    assert_eq!(table.len(), 4);

    let garbage = fx.archive.with_file_name("lookup.txt");
    std::fs::write(&garbage, "not a lookup")?;
    let table = load(&fx.archive, Some(garbage.as_path()), &LoadOptions::default())?;
    assert_eq!(table.len(), 4);
    Ok(())
}

#[test]
fn source_errors() -> Result<()> {
    let dir = TempDir::new()?;
    let options = LoadOptions::default();

    let err = load(&dir.path().join("absent.zip"), None, &options).unwrap_err();
    assert!(err.is_not_found());

    let only_junk = dir.path().join("junk.zip");
    write_zip(
        &only_junk,
        &[("__MACOSX/._a.csv", b"x".as_slice()), ("readme.txt", b"hello".as_slice())],
    )?;
    let err = load(&only_junk, None, &options).unwrap_err();
    assert!(matches!(err, DataSourceError::NoQualifyingFileInArchive(_)));

    let no_municipality = dir.path().join("cols.zip");
    write_zip(
        &no_municipality,
        &[("a.csv", b"fecha,idcomunidad,idprovincia\n2020-01-01,1,2\n".as_slice())],
    )?;
    let err = load(&no_municipality, None, &options).unwrap_err();
    assert!(matches!(err, DataSourceError::MissingColumn { .. }));

    let undated = dir.path().join("undated.zip");
    write_zip(
        &undated,
        &[(
            "a.csv",
            b"fecha,idcomunidad,idprovincia,municipio\n??,1,2,X\n,1,2,Y\n".as_slice(),
        )],
    )?;
    let err = load(&undated, None, &options).unwrap_err();
    assert!(matches!(err, DataSourceError::EmptyResult));
    Ok(())
}

#[test]
fn cache_reuses_until_source_changes() -> Result<()> {
    let fx = fixture()?;
    let options = LoadOptions::default();
    let mut cache = DatasetCache::new();

    let first = cache.load(&fx.archive, Some(fx.lookup.as_path()), &options)?;
    let second = cache.load(&fx.archive, Some(fx.lookup.as_path()), &options)?;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.parses(), 1);

    // Same path, different contents.
    write_zip(
        &fx.archive,
        &[(
            "fires-all.csv",
            b"fecha,idcomunidad,idprovincia,municipio,superficie\n2019-05-05,1,10,A,3\n".as_slice(),
        )],
    )?;
    let third = cache.load(&fx.archive, Some(fx.lookup.as_path()), &options)?;
    assert_eq!(cache.parses(), 2);
    assert_eq!(third.len(), 1);
    assert_eq!(cache.len(), 1);

    cache.invalidate(&fx.archive);
    assert!(cache.is_empty());
    Ok(())
}

#[test]
fn parquet_entry_loads_like_csv() -> Result<()> {
    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec!["2018-06-01", "2019-06-01"])),
        Arc::new(Int64Array::from(vec![1, 2])),
        Arc::new(Int64Array::from(vec![10, 20])),
        Arc::new(StringArray::from(vec!["A", "C"])),
        Arc::new(Float64Array::from(vec![Some(11.0), None])),
    ];
    let names = ["fecha", "idcomunidad", "idprovincia", "municipio", "superficie"];
    let schema = Arc::new(Schema::new(
        names
            .iter()
            .zip(&columns)
            .map(|(n, c)| Field::new(*n, c.data_type().clone(), true))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    let fx = fixture()?;
    let archive = fx.archive.with_file_name("fires.parquet.zip");
    write_zip(&archive, &[("fires.parquet", buf.as_slice())])?;

    let table = load(&archive, Some(fx.lookup.as_path()), &LoadOptions::default())?;
    assert_eq!(table.len(), 2);
    assert_eq!(table.years(), &[2018, 2019]);
    let view = filter(&table, &FilterParams::full_range(&table));
    assert_eq!(view.region_options, vec!["Asturias", "Galicia"]);
    assert_eq!(view.aggregates.burned_area, 11.0);
    assert!(!table.has_causes());
    Ok(())
}
