#![forbid(unsafe_code)]

//! Fixed study content: the four hiring scenarios, their candidates, and the
//! session copy shown around them.

use study_kernel_contracts::scenario::{Candidate, CandidateId, Scenario, ScenarioId};
use study_kernel_contracts::ContractViolation;

struct ScenarioText {
    id: ScenarioId,
    title: &'static str,
    text: &'static str,
    candidates: [(&'static str, &'static str, &'static str); 3],
}

static SCENARIOS: [ScenarioText; 4] = [
    ScenarioText {
        id: ScenarioId::CeoA,
        title: "NovaLink",
        text: "NovaLink is a Canadian tech firm, with a team of 5000 employees, that builds smart software to help companies manage their supply chains. We’ve grown across North America and are now preparing to expand into Europe. At the same time, we’re dealing with a hostile takeover attempt from a U.S. competitor. We want to remain independent and grow internationally, without losing our focus or team stability. We are looking for a new CEO to help navigate these challenges and opportunities.",
        candidates: [
            (
                "C1",
                "Richard",
                "In my last role, I oversaw expansion of the company into Germany and the Netherlands. I speak German and have a network of contacts in both countries. Shortly after initiating the expansion, we were confronted by an aggressive takeover attempt. I worked directly with the board and our lawyers, investors, and regulators to fend off the aggression and safeguard shareholder value, while also keeping focus on our long-term corporate goals. I keep people calm and grounded when things heat up.",
            ),
            (
                "C2",
                "Scott",
                "I have successfully led the launch of software technology products in Europe as the vice president of a multinational company. I also helped set up our first offices and client networks in both Germany and Spain. I am fully conversant in German and French, and I know how to effectively navigate cultural and regulatory differences in various contexts. I’m excited about helping companies grow across borders and I like being the person who connects the dots between people and markets.",
            ),
            (
                "C3",
                "John",
                "I have successfully led corporate organizations through intense and challenging internal changes, including board turnover and investor turmoil, while helping the company maintain steady focus and consistently grow profits over time. I have also worked very closely with legal teams on contract disputes, negotiations, and restructuring plans. What I bring to the table is the ability to keep a company calm, collected, and focused while things shift around them.",
            ),
        ],
    },
    ScenarioText {
        id: ScenarioId::CeoB,
        title: "GreenPath",
        text: "GreenPath develops software to help other companies track and reduce their environmental impact in Canada and Europe. We’ve grown quickly to a team of 500, but that growth has created new pressures. We’ve fallen behind in updating our tools and platforms to keep up with new climate regulations, particularly in Europe.  Furthermore, our switch back from remote to in-office mode after the COVID lockdowns has left some staff dissatisfied and unheard. We now want to consolidate and focus on doing two things better: staying ahead of environmental standards and making GreenPath a more connected and desirable place to work. We are looking for a new CEO to help us achieve these goals.",
        candidates: [
            (
                "C1",
                "Thomas",
                "As vice president of a multinational green tech company, I led system updates in Germany and France to help clients comply with new EU climate regulations. Around the same time, COVID restrictions forced a shift to remote work, which caused isolation, low morale, and a loss of shared purpose. I implemented several initiatives to address these challenges, resulting in a 67% increase in retention and a 73% boost in job satisfaction over the next three years. To me, leadership means being steady, compassionate, empathetic, and mission-focused. I still bike to work and strive to live by the values we promote.",
            ),
            (
                "C2",
                "James",
                "I was appointed VP head of human resources while my current company was struggling with low morale and employee retention. My approach was to empathize and view the situation from the employee’s perspective. I initiated steps to make the employees feel heard at every level. This led to the opening of corporate daycare facilities and encouraging flexible hours. We also initiated regular company retreats to reinforce team cohesion. After three years our employee retention rate is 95% and corporate morale at an all-time high. I believe engaged, motivated employees are essential to long-term success and overall profitability.",
            ),
            (
                "C3",
                "Brian",
                "I have held leadership positions at the vice president level in both marketing and finance across several well-established multinational corporations. In my marketing role, we successfully increased U.S. market share by 12% over a two-year period under my direct leadership. In the finance position, I implemented strategic measures to reduce company debt and boost shareholder equity, which ultimately resulted in a 54% increase in our stock value. I consider myself a well-rounded, seasoned corporate executive with a strong track record of results who can position your organization for sustained growth and long-term profitability.",
            ),
        ],
    },
    ScenarioText {
        id: ScenarioId::EceA,
        title: "Little Steps Early Learning Centre",
        text: "Little Steps Early Learning Centre is a large, multi-centre daycare located in various parts of the Greater Toronto Area. Our downtown Toronto centre currently serves 45 children with a team of 8 dedicated staff members. Recently, the centre has been facing increasing challenges related to (i) staff adopting to new curriculum regulations and (ii) classroom management and disruptive behaviour. As a result, the centre is seeking an Early Childhood Educator (ECE) who can provide a firm lead to staff and navigate both staff and classroom conflict effectively.",
        candidates: [
            (
                "C1",
                "Jess",
                "I have worked as a daycare supervisor in the city for the past five years, managing classroom dynamics, staff, and behavioural difficulties. When our center adopted a new play-based curriculum, I supported staff by facilitating planning sessions and sharing strategies that made the shift feel manageable and aligned with their teaching styles. As a supervisor I’ve also managed incidents between children involving disruptive behaviours during class time. By implementing firm and consistent expectations, I was able to prevent further outbursts.",
            ),
            (
                "C2",
                "Mary",
                "For the past three years, I have worked as a staff lead at a preschool where I take pride in fostering a positive team culture rooted in accountability, communication, and respect. This focus on team culture shaped how I support staff through change and new initiatives. As we adopted changes in the curriculum, I collaborated with staff to create simple templates and provide hands-on support. This helped reduce stress and misunderstanding and facilitated greater consistency across classrooms.",
            ),
            (
                "C3",
                "Rebecca",
                "I have three years of experience working as an educator at a learning centre in downtown Toronto. In that role, I guided children through daily activities to support their learning and development. I worked closely with children to build routines that encouraged engagement and confidence. For instance, I regularly led circle time activities, prompting children to participate in games and sing-alongs. Outside of work, I coach a youth soccer team and have received recognition for leading the most improved team.",
            ),
        ],
    },
    ScenarioText {
        id: ScenarioId::EceB,
        title: "Early Minds Academy",
        text: "Early Minds Academy is a large, multi-centre daycare located in various parts of the Greater Vancouver Area. Our downtown Vancouver centre currently serves 45 children with a team of 8 dedicated staff members. At this time, the centre is in the process of enhancing its program to align more closely with modern child-centered approaches that prioritize emotional development and interpersonal learning. As a result, the centre is seeking an Early Childhood Educator (ECE) who is warm, nurturing, and emotionally attuned and keeps abreast of recent research in child development. The ideal candidate will foster close relationships with children and families and bring new proven techniques to the classroom.",
        candidates: [
            (
                "C1",
                "Maya",
                "For the past three years, I have worked at a preschool supporting a program focusing on children’s developmental milestones. I value the importance of clear communication, and I like to host a monthly ‘family morning’ where parents and children can join in on a circle time activity and parents chat informally about their child’s progress. Outside of work, I regularly take professional development courses that I can apply to my own role, as I strongly believe in the value of evidence-based educational strategies.",
            ),
            (
                "C2",
                "Naomi",
                "I have four years of experience working as a classroom assistant, helping implement learning activities and supporting daily routines. I make the effort to speak with parents informally during drop-off and pickup, and I appreciate how these interactions can help build trust over time. I’ve also volunteered at local community events, allowing me to collaborate with different age groups and support environments that bring people together. These are values I hope to bring into my work with children and their families.",
            ),
            (
                "C3",
                "Julia",
                "I spent the past two years working in toddler and preschool classrooms. In these roles, my main focus was helping to plan activities and maintain structured routines for the lead educators to follow. As an activity planner, I communicated effectively with lead educators to develop cohesive daily routines and have maintained contact with many of them even after my contract ended. I highly value continual growth and am always researching new activities that maximize children’s learning and healthy development.",
            ),
        ],
    },
];

pub const WELCOME_HEADING: &str = "Welcome to the experiment";
pub const WELCOME_PARAGRAPHS: [&str; 4] = [
    "Imagine you are a recruiter at NorthStar Talent Collective, you are in charge of reviewing candidate profiles for four different companies looking to hire an employee.",
    "Two companies are looking to hire a new Chief Executive Officer (CEO) and two companies are looking to hire a new Early Childhood Educator (ECE).",
    "You will be presented with information about each company including the qualifications they are looking for in a new employee, and the profiles of three candidates applying for each position.",
    "Your job is to evaluate each candidate and indicate how likely you would be to recommend them for the position considering the companies’ requirements.",
];
pub const INSTRUCTION_PAGES: [&str; 1] = [
    "You will see four different scenarios of companies looking to hire an employee, each with certain qualifications they are looking for. Alongside each hiring scenario, three job applicants will be presented. Each applicant’s profile will either be paired with an image of the applicant or an audio recording of their application. Please pay close attention to the information provided for each candidate as you will need it to make your evaluations. For each scenario, rate all three candidates on a scale of 1 to 7, with 1 being not at all likely to recommend and 7 being very likely to recommend.",
];
pub const RATING_PROMPT: &str =
    "How likely would you be to recommend this candidate? (1=Not at all, 7=Extremely likely)";
pub const AUDIO_TRANSCRIPT_NOTE: &str =
    "The contents in the paragraph below are identical to what is being said in the audio.";
pub const CLOSING_HEADING: &str = "Thank you!";
pub const CLOSING_MESSAGE: &str = "Press SPACE to finish.";

pub fn scenario(id: ScenarioId) -> Scenario {
    let entry = &SCENARIOS[match id {
        ScenarioId::CeoA => 0,
        ScenarioId::CeoB => 1,
        ScenarioId::EceA => 2,
        ScenarioId::EceB => 3,
    }];
    Scenario {
        id: entry.id,
        title: entry.title.to_string(),
        text: entry.text.to_string(),
        candidates: entry
            .candidates
            .iter()
            .filter_map(|(cid, name, bio)| {
                CandidateId::new(*cid).ok().map(|id| Candidate {
                    id,
                    name: name.to_string(),
                    bio: bio.to_string(),
                })
            })
            .collect(),
    }
}

/// All four scenarios, executive pair first, each validated.
pub fn all_scenarios() -> Result<Vec<Scenario>, ContractViolation> {
    use study_kernel_contracts::Validate;

    ScenarioId::ALL
        .into_iter()
        .map(|id| {
            let s = scenario(id);
            s.validate()?;
            Ok(s)
        })
        .collect()
}
