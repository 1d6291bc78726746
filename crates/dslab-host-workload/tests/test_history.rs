use dslab_host_workload::{UnderAllocationRecord, VmUid};

#[test]
fn test_save_csv() {
    let mut record = UnderAllocationRecord::new();
    record.append(&VmUid::new(1, 2), 500., 480.);
    record.append(&VmUid::new(0, 5), 100., 45.5);
    record.append(&VmUid::new(1, 2), 300., 0.);

    let mut path = std::env::temp_dir();
    path.push("dslab-host-workload-test-history.csv");
    record.save_csv(&path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "vm_uid,requested,allocated",
            "1-2,500.0,480.0",
            "1-2,300.0,0.0",
            "0-5,100.0,45.5",
        ]
    );
}

#[test]
fn test_save_empty_record() {
    let record = UnderAllocationRecord::new();
    let mut path = std::env::temp_dir();
    path.push("dslab-host-workload-test-empty-history.csv");
    record.save_csv(&path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(content.is_empty());
}
