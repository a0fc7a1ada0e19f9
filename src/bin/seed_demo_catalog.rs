// ==========================================
// 演示数据: 重建数据库并写入 CS301 去重场景
// ==========================================
// 用法: seed_demo_catalog [db_path]
// 场景:
// - ENG 学院, CSE / EEE 两个院系, CSE 有 A / B 两个班
// - CS301 第5学期 A 班三条开课, 选课人数 [12, 0, 0]
// - 一名 B 班学生误选在 A 班开课
// - CS301 在 CSE 下重复建档两次
// - OE501 公共选修, 限制 EEE
// ==========================================

use chrono::Local;
use college_erp::app::get_default_db_path;
use college_erp::db::{init_schema, open_sqlite_connection};
use college_erp::domain::{CourseType, NewStudent};
use college_erp::repository::SqliteCatalogStore;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

const SEMESTER: i64 = 5;
const YEAR_LABEL: &str = "2024-25";

fn main() -> Result<(), Box<dyn Error>> {
    college_erp::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let store = SqliteCatalogStore::from_connection(Arc::new(Mutex::new(conn)))?;

    seed_demo(&store)?;

    eprintln!("Seeded demo catalog into {}", db_path);
    eprintln!(
        "Try: college-erp --db {} reconcile --college ENG --dept CSE --course CS301 --semester {} --year {}",
        db_path, SEMESTER, YEAR_LABEL
    );
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_demo(store: &SqliteCatalogStore) -> Result<(), Box<dyn Error>> {
    let college = store.insert_college("ENG", "College of Engineering")?;
    let cse = store.insert_department(college, "CSE", "Computer Science")?;
    let eee = store.insert_department(college, "EEE", "Electrical Engineering")?;
    let section_a = store.insert_section(cse, "A")?;
    let section_b = store.insert_section(cse, "B")?;
    let section_e = store.insert_section(eee, "A")?;
    let year = store.insert_academic_year(YEAR_LABEL, true)?;

    let teachers = ["Dr. Rao", "Dr. Iyer", "Dr. Menon", "Dr. Das"]
        .iter()
        .map(|name| store.insert_teacher(name))
        .collect::<Result<Vec<_>, _>>()?;

    // CS301 重复建档
    let cs301 = store.insert_course(cse, "CS301", "Database Management Systems", CourseType::Core, 3)?;
    store.insert_course(cse, "CS301", "Database Management Systems", CourseType::Core, 3)?;

    let oe501 = store.insert_course(cse, "OE501", "Technology Entrepreneurship", CourseType::OpenElective, 3)?;
    store.add_course_restriction(oe501, eee)?;

    // A 班 12 人, B 班 4 人, EEE 3 人
    let mut a_students = Vec::new();
    for i in 1..=12 {
        a_students.push(store.insert_student(&student(college, cse, section_a, &format!("cse-a-{:02}", i)))?);
    }
    let mut b_students = Vec::new();
    for i in 1..=4 {
        b_students.push(store.insert_student(&student(college, cse, section_b, &format!("cse-b-{:02}", i)))?);
    }
    for i in 1..=3 {
        store.insert_student(&student(college, eee, section_e, &format!("eee-a-{:02}", i)))?;
    }

    // A 班三条开课（不同教师）, 人数 [12, 0, 0]
    let a_main = store.insert_offering(cs301, SEMESTER, year, Some(section_a), Some(teachers[0]))?;
    store.insert_offering(cs301, SEMESTER, year, Some(section_a), Some(teachers[1]))?;
    store.insert_offering(cs301, SEMESTER, year, Some(section_a), Some(teachers[2]))?;
    let b_main = store.insert_offering(cs301, SEMESTER, year, Some(section_b), Some(teachers[3]))?;

    for &s in a_students.iter().take(11) {
        store.insert_enrollment(s, a_main)?;
    }
    // B 班学生误选在 A 班开课
    store.insert_enrollment(b_students[0], a_main)?;
    store.insert_enrollment(b_students[1], b_main)?;

    Ok(())
}

fn student(college_id: i64, department_id: i64, section_id: i64, handle: &str) -> NewStudent {
    NewStudent {
        college_id,
        department_id,
        section_id: Some(section_id),
        semester: SEMESTER,
        batch_year: 2022,
        name: handle.to_string(),
        email: Some(format!("{}@college.example", handle)),
    }
}
