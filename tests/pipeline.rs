use chrono::NaiveDate;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use weather_extract::{
    ArchiveClient, CsvSink, DailyMetricSet, LocationTable, RetryPolicy, TableSink,
    WeatherExtractError, WeatherExtractor,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARCHIVE_PATH: &str = "/v1/archive";

fn write_cities(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("cities.csv");
    std::fs::write(
        &path,
        "name,description,latitude,longitude,population\n\
         StateA,CityA,10.0,20.0,100\n\
         StateB,CityB,30.0,40.0,200\n",
    )
    .unwrap();
    path
}

fn extractor(server: &MockServer, cache_dir: &Path) -> WeatherExtractor {
    WeatherExtractor::from_client(
        ArchiveClient::builder()
            .endpoint(format!("{}{}", server.uri(), ARCHIVE_PATH))
            .cache_dir(cache_dir.to_path_buf())
            .retry(RetryPolicy::none())
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap(),
    )
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
}

async fn mount_archive(server: &MockServer) {
    let block = |lat: f64, lon: f64| {
        json!({
            "latitude": lat,
            "longitude": lon,
            "utc_offset_seconds": -18000,
            "timezone": "America/New_York",
            "daily": {
                "time": ["2020-01-01", "2020-01-02"],
                "temperature_2m_max": [40.5, 41.5],
                "precipitation_sum": [null, 0.25]
            }
        })
    };
    Mock::given(method("GET"))
        .and(path(ARCHIVE_PATH))
        .and(query_param("latitude", "10,30"))
        .and(query_param("longitude", "20,40"))
        .and(query_param("temperature_unit", "fahrenheit"))
        .and(query_param("timezone", "America/New_York"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([block(10.0, 20.0), block(30.0, 40.0)])),
        )
        // The second run is answered from the cache.
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn cities_to_csv_end_to_end() -> Result<(), WeatherExtractError> {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    mount_archive(&server).await;

    let locations = LocationTable::load(&write_cities(dir.path())).await?;
    let extractor = extractor(&server, &dir.path().join("cache"));
    let metrics = DailyMetricSet::parse("temperature_2m_max,precipitation_sum")?;

    let table = extractor
        .extract()
        .locations(&locations)
        .start_date(day(1))
        .end_date(day(2))
        .metrics(metrics.clone())
        .call()
        .await?;
    assert_eq!(table.len(), 4);

    let csv = CsvSink::new(&dir.path().join("weather_data.csv"));
    extractor.export(&table, &[&csv]).await?;

    let contents = std::fs::read_to_string(csv.path()).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines[0],
        "index,date,temperature_2m_max,precipitation_sum,City,State,Latitude,Longitude"
    );
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("0,2020-01-01 05:00:00+00:00,40.5,,CityA,StateA,10"));
    assert!(lines[2].starts_with("1,2020-01-02 05:00:00+00:00,41.5,0.25,CityA,StateA,10"));
    assert!(lines[3].starts_with("0,2020-01-01 05:00:00+00:00,40.5,,CityB,StateB,30"));
    assert!(lines[4].starts_with("1,2020-01-02 05:00:00+00:00,41.5,0.25,CityB,StateB,30"));

    let again = extractor
        .extract()
        .locations(&locations)
        .start_date(day(1))
        .end_date(day(2))
        .metrics(metrics)
        .call()
        .await?;
    assert_eq!(again, table);
    Ok(())
}

#[tokio::test]
async fn empty_city_list_writes_a_header_only_csv() -> Result<(), WeatherExtractError> {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let locations = LocationTable::new(Vec::new());

    let extractor = extractor(&server, &dir.path().join("cache"));
    let table = extractor
        .extract()
        .locations(&locations)
        .start_date(day(1))
        .end_date(day(2))
        .call()
        .await?;
    assert!(table.is_empty());

    let csv = CsvSink::new(&dir.path().join("weather_data.csv"));
    assert_eq!(csv.write(&table).await?, 0);
    let contents = std::fs::read_to_string(csv.path()).unwrap();
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.starts_with("index,date,temperature_2m_max,"));
    Ok(())
}

#[tokio::test]
async fn missing_city_file_fails_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    let err = LocationTable::load(&dir.path().join("absent.csv"))
        .await
        .unwrap_err();
    assert!(matches!(
        WeatherExtractError::from(err),
        WeatherExtractError::Location(_)
    ));
}
