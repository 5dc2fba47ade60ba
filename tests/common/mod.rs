#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub struct Fixture {
    pub cohort: PathBuf,
    pub history: PathBuf,
    pub vitals: PathBuf,
}

pub const TODAY: &str = "2024-03-06";

pub fn write_fixture(dir: &Path) -> Fixture {
    let cohort = dir.join("cohort.tsv");
    fs::write(
        &cohort,
        "site_id\tquantity_id\tcycle_id\tvalue\n\
A\tepoc.na\tEQA2401\t140\n\
B\tepoc.na\tEQA2401\t141\n\
C\tepoc.na\tEQA2401\t142\n\
D\tepoc.na\tEQA2401\t139\n\
E\tepoc.na\tEQA2401\t140\n\
F\tepoc.na\tEQA2401\t160\n\
A\tepoc.k\tEQA2401\t4.0\n\
B\tepoc.k\tEQA2401\t4.1\n\
G\tepoc.k\tEQA2401\t4.2\n\
A\tepoc.zz\tEQA2401\t1\n",
    )
    .unwrap();

    let history = dir.join("history.tsv");
    fs::write(
        &history,
        "site_id\tquantity_id\tEQA2401\tEQA2402\tEQA2403\tEQA2404\tEQA2405\n\
S\tepoc.na\t5\t\t\t7\t\n\
T\tepoc.na\t6\t6\t6\t6\t6\n\
U\tepoc.na\t7\t8\t7\t8\t7\n",
    )
    .unwrap();

    let vitals = dir.join("vitals.tsv");
    let mut rows = String::from("patient_id\tmetric\ttimestamp\tvalue\twithin_limits\tcomment\n");
    for (i, v) in [120, 122, 124, 126, 128, 130].iter().enumerate() {
        let (flag, comment) = if i == 5 { ("No", "GP notified") } else { ("Yes", "") };
        rows.push_str(&format!(
            "P1\tSystolic\t2024-03-{:02} 08:00:00\t{}\t{}\t{}\n",
            i + 1,
            v,
            flag,
            comment
        ));
    }
    fs::write(&vitals, rows).unwrap();

    Fixture {
        cohort,
        history,
        vitals,
    }
}
