//! Portal traversals: active sections, public sections and programs

use crate::extract::active::{is_active_row, ActiveDetail, ActiveRow};
use crate::extract::program::{program_ref_id, ProgramDetail, ProgramRow};
use crate::extract::section::{is_section_row, SectionDetail, SectionRow};
use crate::extract::{
    assemble_active_section, assemble_program, assemble_section, read_active_detail, read_active_row,
    read_curriculum, read_program_row, read_section_detail, read_section_row,
};
use crate::models::{ActiveSection, DetailedProgram, DetailedSection};
use crate::navigator::{link_target, DetailTarget, Traversal};
use crate::portal::{ActiveSectionProfile, ProgramProfile, SectionProfile};
use crate::query::{Fragment, Page};
use std::collections::HashMap;
use url::Url;

/// Enrolled sections on the portal home, two hops down to the participants
/// page of each class
pub struct ActiveSectionTraversal<'p> {
    profile: &'p ActiveSectionProfile,
    home_path: &'p str,
    links: [&'p str; 1],
}

impl<'p> ActiveSectionTraversal<'p> {
    pub fn new(profile: &'p ActiveSectionProfile, home_path: &'p str) -> Self {
        Self {
            profile,
            home_path,
            links: [profile.participants_link],
        }
    }
}

impl Traversal for ActiveSectionTraversal<'_> {
    type Row = ActiveRow;
    type Detail = ActiveDetail;
    type Record = ActiveSection;

    fn list_url(&self) -> Option<String> {
        Some(self.home_path.to_string())
    }

    fn list_container(&self) -> &str {
        self.profile.container
    }

    fn row_selector(&self) -> &str {
        self.profile.rows
    }

    fn qualifies(&self, row: &Fragment<'_>) -> bool {
        is_active_row(row)
    }

    fn read_row(&self, row: Fragment<'_>, _list_url: &Url) -> Option<ActiveRow> {
        Some(read_active_row(row, self.profile))
    }

    fn detail_target(&self, row: &ActiveRow, list_url: &Url) -> DetailTarget {
        link_target(row.href.as_deref(), row.onclick.as_deref(), list_url)
    }

    fn follow_links(&self) -> &[&str] {
        &self.links
    }

    fn detail_container(&self) -> &str {
        self.profile.detail_container
    }

    fn read_detail(&self, page: &Page, url: &Url) -> ActiveDetail {
        read_active_detail(page, self.profile, url)
    }

    fn assemble(&self, row: ActiveRow, detail: Option<ActiveDetail>) -> Option<ActiveSection> {
        Some(assemble_active_section(row, detail))
    }

    fn describe(&self, row: &ActiveRow) -> String {
        format!("{} - {}", row.course.code, row.course.name)
    }
}

/// Sections listed by the public search for the selected department
///
/// Sections already in `known` (by reference id) are reused without
/// opening their detail panel.
pub struct SectionTraversal<'p> {
    profile: &'p SectionProfile,
    known: HashMap<String, DetailedSection>,
}

impl<'p> SectionTraversal<'p> {
    pub fn new(profile: &'p SectionProfile, known: Vec<DetailedSection>) -> Self {
        let known = known
            .into_iter()
            .filter(|s| !s.id_ref.is_empty())
            .map(|s| (s.id_ref.clone(), s))
            .collect();
        Self { profile, known }
    }
}

impl Traversal for SectionTraversal<'_> {
    type Row = SectionRow;
    type Detail = SectionDetail;
    type Record = DetailedSection;

    fn list_container(&self) -> &str {
        self.profile.container
    }

    fn row_selector(&self) -> &str {
        self.profile.rows
    }

    fn qualifies(&self, row: &Fragment<'_>) -> bool {
        is_section_row(row, self.profile)
    }

    fn read_row(&self, row: Fragment<'_>, _list_url: &Url) -> Option<SectionRow> {
        Some(read_section_row(row, self.profile))
    }

    fn detail_target(&self, row: &SectionRow, list_url: &Url) -> DetailTarget {
        if row.ref_id.is_empty() {
            return DetailTarget::Unresolved;
        }
        match list_url.join(&self.profile.detail_path_for(&row.ref_id)) {
            Ok(url) => DetailTarget::Url(url),
            Err(_) => DetailTarget::Unresolved,
        }
    }

    fn detail_container(&self) -> &str {
        self.profile.detail_container
    }

    fn read_detail(&self, page: &Page, _url: &Url) -> SectionDetail {
        read_section_detail(page, self.profile)
    }

    fn assemble(&self, row: SectionRow, detail: Option<SectionDetail>) -> Option<DetailedSection> {
        detail.map(|detail| assemble_section(row, detail))
    }

    fn reuse(&self, row: &SectionRow) -> Option<DetailedSection> {
        self.known.get(&row.ref_id).cloned()
    }

    fn describe(&self, row: &SectionRow) -> String {
        format!("{} {} [{}]", row.course.code, row.term, row.ref_id)
    }
}

/// Row of the program listing plus its resolved portal link
pub struct ProgramListing {
    row: ProgramRow,
    target: DetailTarget,
    id_ref: String,
}

/// Undergraduate programs, one hop to the program portal and one more to
/// its curriculum
///
/// Programs already in `known` (by reference id) are reused.
pub struct ProgramTraversal<'p> {
    profile: &'p ProgramProfile,
    links: [&'p str; 1],
    known: HashMap<String, DetailedProgram>,
}

impl<'p> ProgramTraversal<'p> {
    pub fn new(profile: &'p ProgramProfile, known: Vec<DetailedProgram>) -> Self {
        let known = known
            .into_iter()
            .filter(|p| !p.id_ref.is_empty())
            .map(|p| (p.id_ref.clone(), p))
            .collect();
        Self {
            profile,
            links: [profile.curriculum_link],
            known,
        }
    }
}

impl Traversal for ProgramTraversal<'_> {
    type Row = ProgramListing;
    type Detail = ProgramDetail;
    type Record = DetailedProgram;

    fn list_url(&self) -> Option<String> {
        Some(self.profile.list_path.to_string())
    }

    fn list_container(&self) -> &str {
        self.profile.container
    }

    fn row_selector(&self) -> &str {
        self.profile.rows
    }

    fn read_row(&self, row: Fragment<'_>, list_url: &Url) -> Option<ProgramListing> {
        let row = read_program_row(row, self.profile)?;
        let target = link_target(row.href.as_deref(), None, list_url);
        let id_ref = match &target {
            DetailTarget::Url(url) => program_ref_id(url),
            _ => String::new(),
        };
        Some(ProgramListing { row, target, id_ref })
    }

    fn detail_target(&self, listing: &ProgramListing, _list_url: &Url) -> DetailTarget {
        listing.target.clone()
    }

    fn follow_links(&self) -> &[&str] {
        &self.links
    }

    fn detail_container(&self) -> &str {
        self.profile.detail_container
    }

    fn read_detail(&self, page: &Page, _url: &Url) -> ProgramDetail {
        read_curriculum(page, self.profile)
    }

    fn assemble(&self, listing: ProgramListing, detail: Option<ProgramDetail>) -> Option<DetailedProgram> {
        assemble_program(listing.row, listing.id_ref, detail)
    }

    fn reuse(&self, listing: &ProgramListing) -> Option<DetailedProgram> {
        self.known.get(&listing.id_ref).cloned()
    }

    fn describe(&self, listing: &ProgramListing) -> String {
        format!("{} ({})", listing.row.program.title, listing.row.program.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::MapFetcher;
    use crate::browser::DocumentClient;
    use crate::navigator::{Navigator, SkipReason};
    use crate::portal::PortalProfile;

    fn doc(fetcher: MapFetcher) -> DocumentClient<MapFetcher> {
        DocumentClient::new(fetcher, Url::parse("https://sigaa.test").unwrap(), 16)
    }

    const SECTION_LIST: &str = r#"
        <table id="lista-turmas"><tbody>
          <tr class="destaque"><td colspan="8">MATA01 - CÁLCULO A</td></tr>
          <tr><td>2024.1</td><td><a onclick="PainelTurma.show(1)">T01</a></td><td></td><td></td><td>Presencial</td><td></td><td>35M12</td><td>PAF</td></tr>
          <tr><td>2024.1</td><td><a onclick="PainelTurma.show(2)">T02</a></td><td></td><td></td><td>Presencial</td><td></td><td>24N12</td><td>PAF</td></tr>
          <tr><td>2024.1</td><td><a onclick="PainelTurma.show(3)">T03</a></td><td></td><td></td><td>Presencial</td><td></td><td>6T12</td><td>PAF</td></tr>
          <tr><td>2024.1</td><td><a onclick="PainelTurma.show(4)">T04</a></td><td></td><td></td><td>Presencial</td><td></td><td>3M34</td><td>PAF</td></tr>
          <tr><td>2024.1</td><td><a onclick="PainelTurma.show(5)">T05</a></td><td></td><td></td><td>Presencial</td><td></td><td>5N34</td><td>PAF</td></tr>
        </tbody></table>
    "#;

    fn section_detail(capacity: u32) -> String {
        format!(
            r#"<div id="resumo"><table><tbody><tr><th>Capacidade:</th><td>{}</td></tr></tbody></table></div>"#,
            capacity
        )
    }

    fn detail_path(id: u32) -> String {
        PortalProfile::ufba().sections.detail_path_for(&id.to_string())
    }

    #[tokio::test]
    async fn test_section_traversal_isolates_failing_row() {
        let mut fetcher = MapFetcher::new().page("/sigaa/public/turmas/listar.jsf", SECTION_LIST);
        for id in [1, 2, 4, 5] {
            fetcher = fetcher.page(&detail_path(id), &section_detail(id * 10));
        }
        fetcher = fetcher.status(&detail_path(3), 500, "erro interno");
        let mut doc = doc(fetcher);
        doc.navigate("/sigaa/public/turmas/listar.jsf").await.unwrap();
        let list_depth = doc.depth();

        let profile = PortalProfile::ufba();
        let traversal = SectionTraversal::new(&profile.sections, Vec::new());
        let report = Navigator::new(&mut doc).traverse(&traversal).await.unwrap();

        assert_eq!(report.records.len(), 4);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0].reason, SkipReason::DetailFailed(_)));
        assert_eq!(
            report.records.iter().map(|s| s.id_ref.as_str()).collect::<Vec<_>>(),
            vec!["1", "2", "4", "5"]
        );
        assert_eq!(report.records[3].seats_count, 50);
        assert_eq!(report.records[0].course.code, "MATA01");
        assert_eq!(doc.current_url().unwrap().path(), "/sigaa/public/turmas/listar.jsf");
        assert_eq!(doc.depth(), list_depth);
    }

    #[tokio::test]
    async fn test_section_detail_without_summary_is_skipped() {
        let mut fetcher = MapFetcher::new().page("/sigaa/public/turmas/listar.jsf", SECTION_LIST);
        for id in [1, 2, 4, 5] {
            fetcher = fetcher.page(&detail_path(id), &section_detail(id * 10));
        }
        fetcher = fetcher.page(&detail_path(3), "<div id='painel'><p>Turma não encontrada</p></div>");
        let mut doc = doc(fetcher);
        doc.navigate("/sigaa/public/turmas/listar.jsf").await.unwrap();
        let list_depth = doc.depth();
        let list_url = doc.current_url().cloned().unwrap();

        let profile = PortalProfile::ufba();
        let traversal = SectionTraversal::new(&profile.sections, Vec::new());
        let report = Navigator::new(&mut doc).traverse(&traversal).await.unwrap();

        assert_eq!(report.records.len(), 4);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.degraded, 0);
        assert!(matches!(
            &report.skipped[0].reason,
            SkipReason::DetailFailed(msg) if msg.contains("#resumo")
        ));
        assert!(!report.aborted);
        assert_eq!(
            report.records.iter().map(|s| s.id_ref.as_str()).collect::<Vec<_>>(),
            vec!["1", "2", "4", "5"]
        );
        assert_eq!(doc.current_url(), Some(&list_url));
        assert_eq!(doc.depth(), list_depth);
    }

    #[tokio::test]
    async fn test_section_traversal_reuses_known_sections() {
        let profile = PortalProfile::ufba();
        let mut fetcher = MapFetcher::new().page("/sigaa/public/turmas/listar.jsf", SECTION_LIST);
        for id in 1..=5 {
            fetcher = fetcher.page(&detail_path(id), &section_detail(id));
        }
        let mut doc = doc(fetcher);
        doc.navigate("/sigaa/public/turmas/listar.jsf").await.unwrap();

        let first = Navigator::new(&mut doc)
            .traverse(&SectionTraversal::new(&profile.sections, Vec::new()))
            .await
            .unwrap();
        let before = doc.fetcher().requests();

        let traversal = SectionTraversal::new(&profile.sections, first.records.clone());
        let second = Navigator::new(&mut doc).traverse(&traversal).await.unwrap();

        assert_eq!(second.reused, 5);
        assert_eq!(second.records, first.records);
        assert_eq!(doc.fetcher().requests(), before);
    }

    #[tokio::test]
    async fn test_program_traversal_follows_curriculum_link() {
        let profile = PortalProfile::ufba();
        let list = r#"<table class="listagem"><tbody>
            <tr><td><a href="/sigaa/public/curso/portal.jsf?id=10">COMPUTAÇÃO</a></td><td>SALVADOR</td><td>BACHARELADO</td><td>PRESENCIAL</td><td>MT</td></tr>
            <tr><td><a href="/sigaa/public/curso/portal.jsf?id=11">FÍSICA</a></td><td>SALVADOR</td><td>LICENCIATURA</td><td>PRESENCIAL</td><td>N</td></tr>
        </tbody></table>"#;
        let portal = r#"<a href="/sigaa/public/curso/curriculo.jsf?id=10">Currículo</a>"#;
        let curriculum = r#"<div id="formulario"><table><tbody>
            <tr><td>G10</td></tr><tr><td>COMPUTAÇÃO 2024</td></tr>
        </tbody></table></div>"#;

        let fetcher = MapFetcher::new()
            .page(profile.programs.list_path, list)
            .page("/sigaa/public/curso/portal.jsf?id=10", portal)
            .page("/sigaa/public/curso/curriculo.jsf?id=10", curriculum)
            .page("/sigaa/public/curso/portal.jsf?id=11", "<p>sem currículo</p>");
        let mut doc = doc(fetcher);

        let traversal = ProgramTraversal::new(&profile.programs, Vec::new());
        let report = Navigator::new(&mut doc).traverse(&traversal).await.unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].code, "G10");
        assert_eq!(report.records[0].id_ref, "10");
        assert_eq!(report.records[0].title, "COMPUTAÇÃO");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(doc.depth(), 1);
        assert_eq!(doc.current_url().unwrap().path(), "/sigaa/public/curso/lista.jsf");
    }

    #[tokio::test]
    async fn test_active_section_traversal_degrades_without_participants() {
        let profile = PortalProfile::ufba();
        let home = r#"<div id="turmas-portal"><h4>Turmas</h4><p></p><table><tbody>
            <tr><td class="descricao"><a href="/sigaa/ava/turma.jsf?id=1">MATA01 - CÁLCULO A</a></td><td>PAF I</td><td>35M12</td></tr>
            <tr><td class="descricao"><a href="/sigaa/ava/turma.jsf?id=2">MATA02 - ÁLGEBRA</a></td><td>PAF II</td><td>24N12</td></tr>
        </tbody></table></div>"#;
        let class_page = format!(
            r#"<div id="formMenu:j_id_jsp_1857845999_73"><div class="rich-panelbar-content-exterior"><table><tbody><tr><td>
                 <a href="/a">1</a><a href="/b">2</a><a href="/c">3</a><a href="{}">Participantes</a>
               </td></tr></tbody></table></div></div>"#,
            "/sigaa/ava/participantes.jsf?id=1"
        );
        let participants = r#"<h2 id="nomeTurma">MATA01 - CÁLCULO A - T01 (2024.1)</h2>"#;

        let fetcher = MapFetcher::new()
            .page(profile.home.path, home)
            .page("/sigaa/ava/turma.jsf?id=1", &class_page)
            .page("/sigaa/ava/participantes.jsf?id=1", participants)
            .status("/sigaa/ava/turma.jsf?id=2", 403, "");
        let mut doc = doc(fetcher);

        let traversal = ActiveSectionTraversal::new(&profile.active, profile.home.path);
        let report = Navigator::new(&mut doc).traverse(&traversal).await.unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.degraded, 1);
        assert_eq!(report.records[0].class_code, "T01");
        assert_eq!(report.records[0].term, "2024.1");
        assert_eq!(report.records[1].course.code, "MATA02");
        assert_eq!(report.records[1].class_code, "");
        assert_eq!(doc.depth(), 1);
    }
}
