//! Institution profiles
//!
//! Every path, selector and text marker that depends on how an institution
//! deploys SIGAA lives here as data. The navigation and extraction code only
//! ever reads these values, so supporting another institution means adding a
//! profile, not touching the traversal logic.

/// Paths, selectors and markers for one SIGAA deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalProfile {
    /// Institution key, matched case-insensitively
    pub key: &'static str,
    /// Default origin; `[portal] base-url` overrides it
    pub host: &'static str,
    pub auth: AuthProfile,
    pub home: HomeProfile,
    pub active: ActiveSectionProfile,
    pub activities: ActivityProfile,
    pub sections: SectionProfile,
    pub programs: ProgramProfile,
    pub courses: CourseProfile,
    pub teachers: TeacherSearchProfile,
}

/// Login handshake endpoints and response markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthProfile {
    pub login_path: &'static str,
    pub logoff_path: &'static str,
    /// Page requested after login to confirm the session is usable
    pub probe_path: &'static str,
    pub user_field: &'static str,
    pub password_field: &'static str,
    pub submit_field: &'static str,
    pub submit_value: &'static str,
    pub invalid_credentials_marker: &'static str,
    /// Both markers present means the login surface was served again
    pub login_surface_markers: [&'static str; 2],
}

/// Student portal home selectors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeProfile {
    pub path: &'static str,
    pub registration: &'static str,
    pub name: &'static str,
    pub current_term: &'static str,
    pub info_table_rows: &'static str,
    pub email_labels: [&'static str; 2],
    pub picture: &'static str,
    pub unexpected_marker: &'static str,
}

/// Active sections listed on the student portal home
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSectionProfile {
    pub container: &'static str,
    pub rows: &'static str,
    pub detail_link: &'static str,
    /// Menu entry leading from the class page to its participants
    pub participants_link: &'static str,
    pub detail_container: &'static str,
    pub classes_counter: &'static str,
    pub teacher_cards: &'static str,
    pub student_cards: &'static str,
}

/// Upcoming activities on the student portal home
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityProfile {
    pub container: &'static str,
    pub rows: &'static str,
    pub done_icon: &'static str,
    pub default_type: &'static str,
    pub default_course: &'static str,
    pub default_title: &'static str,
}

/// Public section search (per department) and section detail panels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionProfile {
    pub search_path: &'static str,
    pub department_options: &'static str,
    pub search_form: &'static str,
    pub department_field: &'static str,
    pub submit_field: &'static str,
    pub submit_value: &'static str,
    pub container: &'static str,
    pub rows: &'static str,
    pub header_class: &'static str,
    pub ref_link: &'static str,
    /// `{id}` is replaced by the section reference id
    pub detail_path: &'static str,
    pub detail_container: &'static str,
    pub detail_labels: &'static str,
    pub nested_tables: &'static str,
    pub nested_header: &'static str,
}

/// Public program listing and curriculum pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramProfile {
    pub list_path: &'static str,
    pub container: &'static str,
    pub rows: &'static str,
    pub detail_link: &'static str,
    pub curriculum_link: &'static str,
    pub detail_container: &'static str,
    pub code: &'static str,
    pub title: &'static str,
    pub tab_panel: &'static str,
    pub tab_contents: &'static str,
    pub course_rows: &'static str,
    pub default_course_type: &'static str,
}

/// Component detail panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseProfile {
    /// `{id}` is replaced by the component reference id
    pub detail_path: &'static str,
    pub detail_container: &'static str,
    pub labels: &'static str,
}

/// Public teacher search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherSearchProfile {
    pub path: &'static str,
    pub campus_options: &'static str,
    pub form: &'static str,
    pub form_id_field: &'static str,
    pub name_field: &'static str,
    pub campus_field: &'static str,
    pub submit_field: &'static str,
    pub any_campus: &'static str,
    pub result_rows: &'static str,
    pub result_name: &'static str,
    pub result_department: &'static str,
    pub result_page_link: &'static str,
    pub contact_items: &'static str,
    pub email_label: &'static str,
    pub email_missing: &'static str,
    pub no_picture_marker: &'static str,
}

impl PortalProfile {
    /// Looks up the profile for an institution key (case-insensitive)
    pub fn for_institution(key: &str) -> Option<Self> {
        let key = key.trim();
        [Self::ufba()]
            .into_iter()
            .find(|profile| profile.key.eq_ignore_ascii_case(key))
    }

    /// Universidade Federal da Bahia
    pub fn ufba() -> Self {
        Self {
            key: "UFBA",
            host: "https://sigaa.ufba.br",
            auth: AuthProfile {
                login_path: "/sigaa/logar.do?dispatch=logOn",
                logoff_path: "/sigaa/logar.do?dispatch=logOff",
                probe_path: "/sigaa/portais/discente/discente.jsf",
                user_field: "user.login",
                password_field: "user.senha",
                submit_field: "entrar",
                submit_value: "Entrar",
                invalid_credentials_marker: "Usuário e/ou senha inválidos",
                login_surface_markers: ["/sigaa/logar.do", "loginForm"],
            },
            home: HomeProfile {
                path: "/sigaa/portais/discente/discente.jsf",
                registration: "#agenda-docente > table > tbody > tr:nth-child(1) > td:nth-child(2)",
                name: "#info-usuario > p.usuario > span",
                current_term: "#info-usuario > p.periodo-atual",
                info_table_rows: "#agenda-docente > table tr",
                email_labels: ["e-mail:", "e-mail"],
                picture: "#perfil-docente > div.pessoal-docente > div.foto > img",
                unexpected_marker: "O sistema comportou-se de forma inesperada",
            },
            active: ActiveSectionProfile {
                container: "#turmas-portal > table:nth-child(3)",
                rows: "tbody > tr",
                detail_link: "td.descricao a",
                participants_link: r"#formMenu\:j_id_jsp_1857845999_73 > div.rich-panelbar-content-exterior > table > tbody > tr > td > a:nth-child(4)",
                detail_container: "#nomeTurma",
                classes_counter: r"#j_id_jsp_345573504_153_body > div:nth-child(1) > i",
                teacher_cards: "#j_id_jsp_345573504_298 > table:nth-child(3)",
                student_cards: "#j_id_jsp_345573504_298 > table:nth-child(6)",
            },
            activities: ActivityProfile {
                container: "#avaliacao-portal > table",
                rows: "tbody > tr",
                done_icon: "check.png",
                default_type: "Atividade",
                default_course: "Curso",
                default_title: "Sem título",
            },
            sections: SectionProfile {
                search_path: "/sigaa/public/turmas/listar.jsf",
                department_options: r"select#formTurma\:inputDepto > option",
                search_form: "form#formTurma",
                department_field: "formTurma:inputDepto",
                submit_field: "formTurma:j_id_jsp_1370969402_11",
                submit_value: "Buscar",
                container: "#lista-turmas",
                rows: "#lista-turmas > tbody > tr",
                header_class: "destaque",
                ref_link: "td:nth-child(2) a",
                detail_path: "/sigaa/graduacao/turma/view_painel.jsf?ajaxRequest=true&contarMatriculados=true&id={id}",
                detail_container: "#resumo",
                detail_labels: "#resumo th",
                nested_tables: "#resumo > table > tbody > tr > td > table table",
                nested_header: "tr.secao > td",
            },
            programs: ProgramProfile {
                list_path: "/sigaa/public/curso/lista.jsf?nivel=G&aba=p-graduacao",
                container: "table.listagem",
                rows: "table.listagem > tbody > tr",
                detail_link: "td a[href]",
                curriculum_link: "a[href*='curriculo']",
                detail_container: "#formulario",
                code: "#formulario > table > tbody > tr:nth-child(1) > td",
                title: "#formulario > table > tbody > tr:nth-child(2) > td",
                tab_panel: r"#formulario\:tab_painel",
                tab_contents: "tbody > tr:nth-child(2) > td[id]",
                course_rows: "table.rich-table > tbody > tr",
                default_course_type: "OBRIGATÓRIO",
            },
            courses: CourseProfile {
                detail_path: "/sigaa/graduacao/componente/view_painel.jsf?ajaxRequest=true&id={id}",
                detail_container: "#resumo",
                labels: "#resumo th",
            },
            teachers: TeacherSearchProfile {
                path: "/sigaa/public/docente/busca_docentes.jsf",
                campus_options: r"select#form\:departamento > option",
                form: "form[name='form']",
                form_id_field: "form",
                name_field: "form:nome",
                campus_field: "form:departamento",
                submit_field: "form:buscar",
                any_campus: "0",
                result_rows: "table.listagem > tbody > tr[class]",
                result_name: "span.nome",
                result_department: "span.departamento",
                result_page_link: "span.pagina > a",
                contact_items: "#contato > *",
                email_label: "Endereço eletrônico",
                email_missing: "não informado",
                no_picture_marker: "no_picture.png",
            },
        }
    }
}

impl SectionProfile {
    pub fn detail_path_for(&self, ref_id: &str) -> String {
        self.detail_path.replace("{id}", ref_id)
    }
}

impl CourseProfile {
    pub fn detail_path_for(&self, ref_id: &str) -> String {
        self.detail_path.replace("{id}", ref_id)
    }
}
