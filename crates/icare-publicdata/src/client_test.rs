use super::*;

fn test_client(base_url: &str) -> PublicDataClient {
    PublicDataClient::with_base_url("test-key", 30, base_url)
        .expect("client construction should not fail")
}

#[test]
fn build_url_joins_path_and_query() {
    let client = test_client("http://apis.data.go.kr");
    let url = client
        .build_url(HOSPITAL_DETAIL, &[("ykiho", "abc")])
        .unwrap();
    assert_eq!(
        url.as_str(),
        "http://apis.data.go.kr/B551182/MadmDtlInfoService2.7/getDtlInfo2.7?serviceKey=test-key&ykiho=abc"
    );
}

#[test]
fn encoded_service_key_is_decoded_once() {
    assert_eq!(decode_service_key("abc%2Bdef%3D%3D"), "abc+def==");
    assert_eq!(decode_service_key(" plain "), "plain");

    let encoded = PublicDataClient::with_base_url("abc%2Bdef%3D%3D", 30, "http://x").unwrap();
    let url = encoded.build_url(DRUG_EASY_INFO, &[]).unwrap();
    assert!(url.as_str().contains("serviceKey=abc%2Bdef%3D%3D"), "{url}");
}

#[test]
fn parse_page_reads_items_and_total_count() {
    let xml = r"<response>
        <header><resultCode>00</resultCode><resultMsg>NORMAL SERVICE.</resultMsg></header>
        <body>
            <items>
                <item><hpid>C1</hpid><dutyName>온누리약국</dutyName><dutyTime1s>0900</dutyTime1s></item>
                <item><hpid>C2</hpid><dutyName>새봄약국</dutyName></item>
            </items>
            <numOfRows>2</numOfRows><pageNo>1</pageNo><totalCount>25</totalCount>
        </body>
    </response>";
    let page: Page<PharmacyItem> = parse_page(xml, "test").unwrap();
    assert_eq!(page.total_count, 25);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].duty_name.as_deref(), Some("온누리약국"));
    assert_eq!(page.items[0].duty_time1s.as_deref(), Some("0900"));
    assert!(page.items[1].duty_time1s.is_none());
}

#[test]
fn parse_page_single_item_is_a_list_of_one() {
    let xml = r"<response>
        <header><resultCode>00</resultCode><resultMsg>OK</resultMsg></header>
        <body><items><item><ykiho>Y1</ykiho><yadmNm>튼튼의원</yadmNm></item></items><totalCount>1</totalCount></body>
    </response>";
    let page: Page<HospitalBasisItem> = parse_page(xml, "test").unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].ykiho.as_deref(), Some("Y1"));
}

#[test]
fn parse_page_empty_items() {
    let xml = r"<response>
        <header><resultCode>00</resultCode><resultMsg>OK</resultMsg></header>
        <body><items/><totalCount>0</totalCount></body>
    </response>";
    let page: Page<HospitalBasisItem> = parse_page(xml, "test").unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_count, 0);
}

#[test]
fn parse_page_surfaces_result_code_errors() {
    let xml = r"<response>
        <header><resultCode>30</resultCode><resultMsg>SERVICE_KEY_IS_NOT_REGISTERED_ERROR</resultMsg></header>
    </response>";
    let err = parse_page::<PharmacyItem>(xml, "test").unwrap_err();
    assert!(
        matches!(err, PublicDataError::Api { ref code, .. } if code == "30"),
        "got {err:?}"
    );
}

#[test]
fn parse_page_rejects_non_xml() {
    let err = parse_page::<PharmacyItem>("not xml at all", "test").unwrap_err();
    assert!(matches!(err, PublicDataError::Xml { .. }));
}
